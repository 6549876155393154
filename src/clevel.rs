//! Complexity-level engine.
//!
//! `measure` runs an ordered battery of checks over a populated record and
//! returns the smallest conforming CLEVEL — the maximum of the individual
//! check results, each of which is a non-decreasing step function of its
//! inputs. An unreadable field aborts the measurement with a `Parse` error.

use std::fmt;

use crate::error::Result;
use crate::record::Record;
use crate::segment::ImageSubheader;

/// Complexity level of a NITF 2.1 file. Ordering follows severity, with
/// `Unknown` at the bottom so it never raises a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Clevel {
    Unknown,
    L03,
    L05,
    L06,
    L07,
    L09,
}

impl Clevel {
    /// Two-digit CLEVEL field value. `Unknown` maps to "09".
    pub fn as_str(self) -> &'static str {
        match self {
            Clevel::L03 => "03",
            Clevel::L05 => "05",
            Clevel::L06 => "06",
            Clevel::L07 => "07",
            Clevel::L09 | Clevel::Unknown => "09",
        }
    }
}

impl fmt::Display for Clevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measure the record: the maximum over all checks.
pub fn measure(record: &Record) -> Result<Clevel> {
    let checks: [fn(&Record) -> Result<Clevel>; 7] = [
        check_ccs_extent,
        check_file_size,
        check_image_size,
        check_block_size,
        check_num_images,
        check_num_des,
        check_image_attributes,
    ];
    let mut level = Clevel::Unknown;
    for check in checks {
        level = level.max(check(record)?);
    }
    Ok(level)
}

/// Parse the CLEVEL field of an existing record. Anything outside the
/// conforming set reads as `Unknown`.
pub fn get(record: &Record) -> Clevel {
    match &*record.header.clevel.as_str() {
        "03" => Clevel::L03,
        "05" => Clevel::L05,
        "06" => Clevel::L06,
        "07" => Clevel::L07,
        "09" => Clevel::L09,
        _ => Clevel::Unknown,
    }
}

// ── Checks ─────────────────────────────────────────────────────────

/// Common Coordinate System extent: the inclusive last row/column of each
/// image, from ILOC plus the image dimensions.
fn check_ccs_extent(record: &Record) -> Result<Clevel> {
    let mut level = Clevel::L03;
    for image in &record.images {
        level = level.max(check_iloc(&image.subheader)?);
    }
    Ok(level)
}

fn check_iloc(subheader: &ImageSubheader) -> Result<Clevel> {
    let raw = subheader.iloc.raw();
    if raw.len() != 10 {
        return Err(crate::error::NitfError::Parse(format!(
            "ILOC must be 10 bytes, found {}",
            raw.len()
        )));
    }
    let row = parse_coordinate(&String::from_utf8_lossy(&raw[..5]));
    let col = parse_coordinate(&String::from_utf8_lossy(&raw[5..]));
    let nrows = subheader.nrows.as_i64()?;
    let ncols = subheader.ncols.as_i64()?;

    let last_row = row + nrows - 1;
    let last_col = col + ncols - 1;
    Ok(if last_row <= 2047 && last_col <= 2047 {
        Clevel::L03
    } else if last_row <= 8191 && last_col <= 8191 {
        Clevel::L05
    } else if last_row <= 65_535 && last_col <= 65_535 {
        Clevel::L06
    } else if last_row <= 99_999_999 && last_col <= 99_999_999 {
        Clevel::L07
    } else {
        Clevel::L09
    })
}

/// ILOC halves carry a sign and digits; anything unparsable reads as zero.
fn parse_coordinate(text: &str) -> i64 {
    text.trim().parse().unwrap_or(0)
}

fn check_file_size(record: &Record) -> Result<Clevel> {
    let fl = record.header.fl.as_i64()?;
    Ok(if fl <= 52_428_799 {
        Clevel::L03
    } else if fl <= 1_073_741_823 {
        Clevel::L05
    } else if fl <= 2_147_483_647 {
        Clevel::L06
    } else if fl <= 10_737_418_239 {
        Clevel::L07
    } else {
        Clevel::L09
    })
}

fn check_image_size(record: &Record) -> Result<Clevel> {
    let mut level = Clevel::L03;
    for image in &record.images {
        let nrows = image.subheader.nrows.as_i64()?;
        let ncols = image.subheader.ncols.as_i64()?;
        level = level.max(if nrows <= 2048 && ncols <= 2048 {
            Clevel::L03
        } else if nrows <= 8192 && ncols <= 8192 {
            Clevel::L05
        } else if nrows <= 65_536 && ncols <= 65_536 {
            Clevel::L06
        } else if nrows <= 99_999_999 && ncols <= 99_999_999 {
            Clevel::L07
        } else {
            Clevel::L09
        });
    }
    Ok(level)
}

fn check_block_size(record: &Record) -> Result<Clevel> {
    let mut level = Clevel::L03;
    for image in &record.images {
        let nppbh = image.subheader.nppbh.as_i64()?;
        let nppbv = image.subheader.nppbv.as_i64()?;
        level = level.max(if nppbh <= 0 || nppbv <= 0 {
            Clevel::L09
        } else if nppbh <= 2048 && nppbv <= 2048 {
            Clevel::L03
        } else if nppbh <= 8192 && nppbv <= 8192 {
            Clevel::L05
        } else {
            Clevel::L06
        });
    }
    Ok(level)
}

fn check_num_images(record: &Record) -> Result<Clevel> {
    let numi = record.num_images()?;
    Ok(if numi > 20 { Clevel::L05 } else { Clevel::L03 })
}

fn check_num_des(record: &Record) -> Result<Clevel> {
    let numdes = record.num_data_extensions()?;
    Ok(if numdes <= 10 {
        Clevel::L03
    } else if numdes <= 50 {
        Clevel::L06
    } else if numdes <= 100 {
        Clevel::L07
    } else {
        Clevel::L09
    })
}

// ── Image-attribute check, dispatched on IREP ──────────────────────

fn check_image_attributes(record: &Record) -> Result<Clevel> {
    let mut level = Clevel::L03;
    for image in &record.images {
        let subheader = &image.subheader;
        let result = match subheader.irep.trimmed().as_str() {
            "MONO" => check_mono_image(subheader)?,
            "RGB" => check_rgb_image(subheader)?,
            "RGB/LUT" => check_rgb_lut_image(subheader)?,
            "MULTI" => check_multi_image(subheader)?,
            // Other representations neither raise nor cap the level.
            _ => return Ok(Clevel::Unknown),
        };
        level = level.max(result);
    }
    Ok(level)
}

fn ic_is(subheader: &ImageSubheader, code: &str) -> bool {
    subheader.ic.raw().starts_with(code.as_bytes())
}

fn imode_char(subheader: &ImageSubheader) -> u8 {
    subheader.imode.raw().first().copied().unwrap_or(b' ')
}

fn check_mono_image(subheader: &ImageSubheader) -> Result<Clevel> {
    let nbands = subheader.nbands.as_i64()?;
    let nbpp = subheader.nbpp.as_i64()?;
    let imode = imode_char(subheader);

    let mut level = Clevel::L03;
    if (ic_is(subheader, "C3") || ic_is(subheader, "M3")) && !matches!(nbpp, 8 | 12) {
        level = Clevel::L09;
    }
    if nbands != 1 {
        level = Clevel::L09;
    } else if !matches!(nbpp, 1 | 8 | 12 | 16 | 32 | 64) {
        level = Clevel::L09;
    } else if imode != b'B' {
        level = Clevel::L09;
    }
    Ok(level)
}

fn check_rgb_image(subheader: &ImageSubheader) -> Result<Clevel> {
    let nbands = subheader.nbands.as_i64()?;
    let nbpp = subheader.nbpp.as_i64()?;
    let imode = imode_char(subheader);

    let mut level = Clevel::L03;
    if (ic_is(subheader, "C8") || ic_is(subheader, "M8")) && nbpp > 32 {
        level = Clevel::L09;
    }
    if (ic_is(subheader, "C3") || ic_is(subheader, "M3")) && (nbpp > 8 || imode != b'P') {
        level = Clevel::L09;
    }
    if nbands != 3 {
        level = Clevel::L09;
    } else if !matches!(imode, b'B' | b'P' | b'S' | b'R') {
        level = Clevel::L09;
    } else if matches!(nbpp, 16 | 32) {
        level = level.max(Clevel::L06);
    } else if nbpp != 8 {
        level = Clevel::L09;
    }
    Ok(level)
}

fn check_rgb_lut_image(subheader: &ImageSubheader) -> Result<Clevel> {
    let nbands = subheader.nbands.as_i64()?;
    let nbpp = subheader.nbpp.as_i64()?;
    let imode = imode_char(subheader);

    let mut level = Clevel::L03;
    if !ic_is(subheader, "NC") && !ic_is(subheader, "NM") {
        level = Clevel::L09;
    }
    if nbands != 1 {
        level = Clevel::L09;
    } else if !matches!(nbpp, 1 | 8) {
        level = Clevel::L09;
    } else if imode != b'B' {
        level = Clevel::L09;
    }
    Ok(level)
}

fn check_multi_image(subheader: &ImageSubheader) -> Result<Clevel> {
    let nbands = subheader.nbands.as_i64()?;
    let nbpp = subheader.nbpp.as_i64()?;
    let imode = imode_char(subheader);

    let mut level = Clevel::L03;
    if ic_is(subheader, "C8") || ic_is(subheader, "M8") {
        if imode == b'B' || nbpp > 32 {
            level = Clevel::L09;
        }
    } else if (ic_is(subheader, "C3") || ic_is(subheader, "M3")) && !matches!(nbpp, 8 | 12) {
        return Ok(Clevel::L09);
    }

    if nbands < 2 {
        level = Clevel::L09;
    } else if nbands < 10 {
        // Two to nine bands stay at the floor.
    } else if nbands <= 255 {
        level = level.max(Clevel::L06);
    } else if nbands <= 999 {
        level = level.max(Clevel::L07);
    } else {
        level = Clevel::L09;
    }

    if !matches!(nbpp, 8 | 16 | 32 | 64) {
        level = Clevel::L09;
    } else if imode != b'B' {
        level = Clevel::L09;
    }
    Ok(level)
}

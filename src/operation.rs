//! Forward transforms as data.
//!
//! An [`Operation`] names one of the five pixel transforms together with its
//! arguments. The engine validates it, runs it through the codec, and logs it
//! under [`Operation::name`] with [`Operation::params`].
//!
//! Operations also parse from the compact `name[=args]` form used on the
//! command line:
//!
//! | Text | Operation |
//! |---|---|
//! | `resize=640x480` | `Resize { width: 640, height: 480 }` |
//! | `grayscale` | `Grayscale` |
//! | `blur=2.5` | `Blur { radius: 2.5 }` |
//! | `brightness=1.2` | `Brightness { factor: 1.2 }` |
//! | `contrast=0.8` | `Contrast { factor: 0.8 }` |

use crate::history::Params;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ParseOperationError {
    #[error("Unknown operation '{0}'")]
    Unknown(String),
    #[error("'{name}' expects {expected}, got '{got}'")]
    BadArgument {
        name: &'static str,
        expected: &'static str,
        got: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Operation {
    Resize { width: u32, height: u32 },
    Grayscale,
    Blur { radius: f32 },
    Brightness { factor: f32 },
    Contrast { factor: f32 },
}

impl Operation {
    /// Tag written to the history log.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Resize { .. } => "resize",
            Self::Grayscale => "grayscale",
            Self::Blur { .. } => "blur",
            Self::Brightness { .. } => "brightness",
            Self::Contrast { .. } => "contrast",
        }
    }

    /// Parameters written to the history log.
    pub fn params(&self) -> Params {
        let mut params = Params::new();
        match *self {
            Self::Resize { width, height } => {
                params.insert("w".into(), width.into());
                params.insert("h".into(), height.into());
            }
            Self::Grayscale => {}
            Self::Blur { radius } => {
                params.insert("radius".into(), radius.into());
            }
            Self::Brightness { factor } | Self::Contrast { factor } => {
                params.insert("factor".into(), factor.into());
            }
        }
        params
    }

    /// Argument check, independent of any image.
    pub fn validate(&self) -> Result<(), String> {
        match *self {
            Self::Resize { width, height } if width == 0 || height == 0 => Err(format!(
                "resize dimensions must be positive, got {width}x{height}"
            )),
            Self::Blur { radius } if !radius.is_finite() || radius < 0.0 => Err(format!(
                "blur radius must be a non-negative number, got {radius}"
            )),
            Self::Brightness { factor } | Self::Contrast { factor }
                if !factor.is_finite() || factor < 0.0 =>
            {
                Err(format!(
                    "{} factor must be a non-negative number, got {factor}",
                    self.name()
                ))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resize { width, height } => write!(f, "resize={width}x{height}"),
            Self::Grayscale => f.write_str("grayscale"),
            Self::Blur { radius } => write!(f, "blur={radius}"),
            Self::Brightness { factor } => write!(f, "brightness={factor}"),
            Self::Contrast { factor } => write!(f, "contrast={factor}"),
        }
    }
}

/// Parse `WxH` (also accepts `W,H`).
pub(crate) fn parse_dimensions(text: &str) -> Option<(u32, u32)> {
    let (w, h) = text.split_once(['x', 'X', ','])?;
    Some((w.trim().parse().ok()?, h.trim().parse().ok()?))
}

fn parse_number(name: &'static str, text: &str) -> Result<f32, ParseOperationError> {
    text.trim()
        .parse()
        .map_err(|_| ParseOperationError::BadArgument {
            name,
            expected: "a number",
            got: text.to_string(),
        })
}

impl FromStr for Operation {
    type Err = ParseOperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, arg) = match s.split_once('=') {
            Some((name, arg)) => (name.trim(), Some(arg)),
            None => (s.trim(), None),
        };
        let missing = |name: &'static str, expected: &'static str| {
            ParseOperationError::BadArgument {
                name,
                expected,
                got: String::new(),
            }
        };

        match name.to_ascii_lowercase().as_str() {
            "resize" => {
                let arg = arg.ok_or_else(|| missing("resize", "WxH"))?;
                let (width, height) =
                    parse_dimensions(arg).ok_or_else(|| ParseOperationError::BadArgument {
                        name: "resize",
                        expected: "WxH",
                        got: arg.to_string(),
                    })?;
                Ok(Self::Resize { width, height })
            }
            "grayscale" | "greyscale" | "gray" => Ok(Self::Grayscale),
            "blur" => Ok(Self::Blur {
                radius: arg.map_or(Ok(1.0), |a| parse_number("blur", a))?,
            }),
            "brightness" => {
                let arg = arg.ok_or_else(|| missing("brightness", "a number"))?;
                Ok(Self::Brightness {
                    factor: parse_number("brightness", arg)?,
                })
            }
            "contrast" => {
                let arg = arg.ok_or_else(|| missing("contrast", "a number"))?;
                Ok(Self::Contrast {
                    factor: parse_number("contrast", arg)?,
                })
            }
            _ => Err(ParseOperationError::Unknown(name.to_string())),
        }
    }
}

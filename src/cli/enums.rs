//! CLI argument enums mapping onto library types.

use clap::ValueEnum;

use framegrab::grabber::PixelFormat;
use framegrab::synthetic::TestPattern;

/// Pixel format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Rgb,
    Rgba,
    Yuyv,
    Nv12,
}

impl From<FormatArg> for PixelFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Rgb => PixelFormat::Rgb,
            FormatArg::Rgba => PixelFormat::Rgba,
            FormatArg::Yuyv => PixelFormat::Yuyv,
            FormatArg::Nv12 => PixelFormat::Nv12,
        }
    }
}

/// Test pattern argument for the synthetic devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PatternArg {
    Bars,
    Gradient,
    Solid,
    Counter,
}

impl From<PatternArg> for TestPattern {
    fn from(arg: PatternArg) -> Self {
        match arg {
            PatternArg::Bars => TestPattern::ColorBars,
            PatternArg::Gradient => TestPattern::Gradient,
            // Mid gray
            PatternArg::Solid => TestPattern::Solid(128, 128, 128),
            PatternArg::Counter => TestPattern::Counter,
        }
    }
}

use colored::Color;

pub const BANNER: Color = Color::BrightGreen;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const KEY: Color = Color::White;
pub const VALUE: Color = Color::BrightBlue;

pub const SUCCEEDED: Color = Color::Green;
pub const FAILED: Color = Color::Red;
pub const TIMED_OUT: Color = Color::Yellow;
pub const CANCELLED: Color = Color::Magenta;

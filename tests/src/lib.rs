mod execution;
mod generation;
mod util;

//! Unit tests mirroring the `src/` tree, one file per source file

mod cases;
mod io;
mod math;
mod solver;

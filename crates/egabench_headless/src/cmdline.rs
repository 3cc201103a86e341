/*
    egabench
    https://github.com/dbalsom/egabench

    Copyright 2022-2025 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    cmdline.rs

    Routines to parse command line arguments.

*/

use std::path::PathBuf;

use bpaf::Bpaf;

pub const DEFAULT_ITERATIONS: u32 = 1000;
pub const DEFAULT_TIMER_RATE: u32 = 1000;

#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
pub struct CmdLineArgs {
    /// Path to the full-screen planar image asset
    #[bpaf(long("image"), argument("PATH"), fallback(PathBuf::from("BONUSSCN.MNI")))]
    pub image: PathBuf,

    /// Path to the tile-set planar image asset
    #[bpaf(long("tiles"), argument("PATH"), fallback(PathBuf::from("DROP12.MNI")))]
    pub tiles: PathBuf,

    /// Iterations per measured phase (the slow tiled phase runs half)
    #[bpaf(positional("ITERATIONS"), fallback(DEFAULT_ITERATIONS))]
    pub iterations: u32,

    /// Timer interrupt rate in Hz
    #[bpaf(positional("TIMER_RATE"), fallback(DEFAULT_TIMER_RATE))]
    pub timer_rate: u32,
}

//! lapwing-io: filesystem collaborators for the lapwing engine.
//!
//! - [`FileSource`] reads and decodes one input file.
//! - [`PngDirSink`] encodes output grids as PNG files in a directory.
//! - [`ensure_output_dir`] and [`derive_output_name`] decide where each
//!   output goes.
//!
//! The engine itself never touches the filesystem; everything here plugs
//! into it through [`lapwing_engine::ImageSource`] and
//! [`lapwing_engine::PixelSink`].

pub mod decode;
pub mod encode;
pub mod output;

pub use decode::{FileSource, SourceError, decode_bytes};
pub use encode::{PngDirSink, SinkError, encode_png};
pub use output::{
    DEFAULT_OUTPUT_DIR, OUTPUT_EXTENSION, OutputDirError, derive_output_name, ensure_output_dir,
    output_path,
};

//! Reading, patching and writing the editor's save container.

pub mod codec;
pub mod fragments;
pub mod path;
pub mod splice;

pub use codec::{CodecError, SaveCodec, DEFAULT_XOR_KEY, PLAINTEXT_HEADER};
pub use fragments::{Fragments, FragmentsError};
pub use path::{default_save_path, SAVE_FILE_NAME};
pub use splice::{splice_level, IndexedRegion, LevelMeta, SpliceError, ANCHOR_MARKER};

//! Decoder for WLD asset files and the material and placeable graphs they
//! describe.
//!
//! Three-layer architecture:
//! - **Layer 1** (`reader`/`writer`): header, name table, fragment index
//! - **Layer 2** (`fragments`): typed decoders for individual fragment kinds
//! - **Layer 3** (`wld`, `sprite`, `placeable`): eagerly decoded document,
//!   reference resolution, the slot → sprite → texture file graph and the
//!   object location → model → mesh graph

pub mod config;
pub mod cursor;
pub mod error;
pub mod fragments;
pub mod namehash;
pub mod placeable;
pub mod reader;
pub mod sprite;
pub mod texture;
pub mod version;
pub mod wld;
pub mod writer;

pub use config::DecodeOptions;
pub use error::{Error, Result};
pub use fragments::{Fragment, FragmentBody, FragmentKind};
pub use placeable::{Placeable, PlaceableBuilder, PlaceableError, PlaceableTable};
pub use reader::{FragmentIndex, WldHeader};
pub use sprite::{AssetGraphBuilder, Sprite, SpriteError, SpriteSource, SpriteTable, Transparency};
pub use texture::{TextureFile, TextureFormat};
pub use version::WldVersion;
pub use wld::{FragmentSummary, WldDocument};
pub use writer::WldWriter;

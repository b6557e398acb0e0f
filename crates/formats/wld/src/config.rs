/// Options controlling how strictly documents are decoded and how the asset
/// graph is assembled.
///
/// The defaults match what a viewer wants: tolerate polygon-run slack with a
/// warning, strip parameter prefixes from texture names, and check that
/// every texture file exists when an archive is attached.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Fail the document load when a mesh's polygon-texture runs do not cover
    /// exactly its triangle list.
    pub strict_polygon_runs: bool,
    /// Strip `"1, 4, 0, "`-style prefixes from bitmap file names.
    pub strip_texture_parameters: bool,
    /// Drop sprite slots whose texture files are missing from the archive.
    pub verify_texture_files: bool,
    /// Frame name used for materials that resolve to neither a bitmap chain
    /// nor a bitmap name fragment.
    pub placeholder_texture: String,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            strict_polygon_runs: false,
            strip_texture_parameters: true,
            verify_texture_files: true,
            placeholder_texture: "nulltexture".to_string(),
        }
    }
}

impl DecodeOptions {
    /// Create options from a list of flag names, starting from the defaults.
    ///
    /// Recognised flags:
    /// - `"strict"`: enable `strict_polygon_runs`
    /// - `"keep-texture-parameters"`: disable `strip_texture_parameters`
    /// - `"no-verify-textures"`: disable `verify_texture_files`
    pub fn from_flags(flags: &[&str]) -> Self {
        let mut options = Self::default();
        for flag in flags {
            match *flag {
                "strict" => options.strict_polygon_runs = true,
                "keep-texture-parameters" => options.strip_texture_parameters = false,
                "no-verify-textures" => options.verify_texture_files = false,
                _ => {}
            }
        }
        options
    }
}

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use s3d::Archive;
use tracing_subscriber::EnvFilter;
use wld::{AssetGraphBuilder, DecodeOptions, PlaceableBuilder, WldDocument};

#[derive(Parser)]
#[command(name = "wldtool", about = "Inspect S3D archives and their WLD files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the files stored in an archive.
    List {
        archive: PathBuf,
    },
    /// Write one archive entry to disk.
    Extract {
        archive: PathBuf,
        /// Entry name (case-insensitive).
        name: String,
        /// Output path. Defaults to the entry name in the current directory.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Summarise the fragments of a WLD file.
    Fragments {
        archive: PathBuf,
        /// WLD entry to decode. Defaults to `<archive stem>.wld`.
        #[arg(long)]
        wld: Option<String>,
        /// Only list fragments of this type code (e.g. "0x36").
        #[arg(long, value_parser = parse_type_code)]
        kind: Option<u32>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
    /// Resolve the sprite of every texture list slot.
    Sprites {
        archive: PathBuf,
        /// WLD entry to decode. Defaults to `<archive stem>.wld`.
        #[arg(long)]
        wld: Option<String>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
        /// Fail on meshes whose polygon runs do not cover their triangles.
        #[arg(long)]
        strict: bool,
        /// Keep "1, 4, 0, "-style prefixes on texture names.
        #[arg(long)]
        keep_texture_parameters: bool,
        /// Do not check that texture files exist in the archive.
        #[arg(long)]
        no_verify_textures: bool,
    },
    /// Resolve every placed object to the mesh it instances.
    Placeables {
        archive: PathBuf,
        /// WLD entry holding the object locations.
        #[arg(long, default_value = "objects.wld")]
        wld: String,
        /// Archive holding the models, usually `<zone>_obj.s3d`. Models are
        /// looked up in the locations file when omitted.
        #[arg(long)]
        models: Option<PathBuf>,
        /// WLD entry in the models archive. Defaults to `<models stem>.wld`.
        #[arg(long)]
        models_wld: Option<String>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

fn parse_type_code(s: &str) -> std::result::Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid type code {s:?}: {e}"))
}

fn open_archive(path: &Path) -> Result<Archive> {
    Archive::open(path).with_context(|| format!("failed to open archive: {}", path.display()))
}

/// `zone.s3d` holds `zone.wld` by convention.
fn default_wld_name(archive: &Path) -> Result<String> {
    let Some(stem) = archive.file_stem().and_then(|s| s.to_str()) else {
        bail!("cannot derive a WLD name from {}; pass --wld", archive.display());
    };
    Ok(format!("{}.wld", stem.to_ascii_lowercase()))
}

fn load_document(archive: &Archive, path: &Path, wld: Option<&str>, options: &DecodeOptions) -> Result<WldDocument> {
    let name = match wld {
        Some(name) => name.to_string(),
        None => default_wld_name(path)?,
    };
    WldDocument::from_archive_with(archive, &name, options)
        .with_context(|| format!("failed to decode {name} from {}", path.display()))
}

fn cmd_list(path: &Path) -> Result<()> {
    let archive = open_archive(path)?;
    for entry in archive.entries() {
        println!("{:>10}  {:08x}  {}", entry.size(), entry.crc, entry.name);
    }
    println!("{} files", archive.len());
    Ok(())
}

fn cmd_extract(path: &Path, name: &str, output: Option<&Path>) -> Result<()> {
    let archive = open_archive(path)?;
    let Some(entry) = archive.entry(name) else {
        bail!("{name} not found in {}", path.display());
    };
    let output = output.map_or_else(|| PathBuf::from(&entry.name), Path::to_path_buf);
    std::fs::write(&output, &entry.data).with_context(|| format!("failed to write {}", output.display()))?;
    println!("wrote {} ({} bytes)", output.display(), entry.size());
    Ok(())
}

fn cmd_fragments(path: &Path, wld: Option<&str>, kind: Option<u32>, json: bool) -> Result<()> {
    let archive = open_archive(path)?;
    let doc = load_document(&archive, path, wld, &DecodeOptions::default())?;
    let rows: Vec<_> = doc
        .summaries()
        .into_iter()
        .filter(|row| kind.map_or(true, |k| row.type_code == k))
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("version {}, {} fragments", doc.version(), doc.len());
    for (code, count) in doc.type_counts() {
        println!("  {code:#04x} {:<34} {count}", wld::fragments::type_name(code));
    }
    println!();
    for row in &rows {
        println!(
            "{:>6}  {:#04x}  {:>8x}  {:>6}  {}",
            row.id, row.type_code, row.offset, row.length, row.name
        );
    }
    Ok(())
}

fn cmd_sprites(path: &Path, wld: Option<&str>, json: bool, options: &DecodeOptions) -> Result<()> {
    let archive = open_archive(path)?;
    let doc = load_document(&archive, path, wld, options)?;
    let Some(table) = AssetGraphBuilder::new(&doc)
        .with_archive(&archive)
        .with_options(options)
        .build()
    else {
        bail!("{} has no texture list", path.display());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    for slot in &table.slots {
        match slot {
            Ok(sprite) => {
                let delay = sprite.anim_delay.map(|d| format!(" every {d}ms")).unwrap_or_default();
                println!(
                    "{:>4}  {:<24} {:?} alpha {:.1}{delay}: {}",
                    sprite.slot,
                    sprite.name,
                    sprite.source,
                    sprite.transparency.alpha(),
                    sprite.frames.join(", ")
                );
            }
            Err(e) => println!("   -  {e}"),
        }
    }
    println!(
        "{} of {} slots resolved",
        table.sprites().count(),
        table.len()
    );
    Ok(())
}

fn cmd_placeables(
    path: &Path,
    wld: &str,
    models: Option<&Path>,
    models_wld: Option<&str>,
    json: bool,
) -> Result<()> {
    let archive = open_archive(path)?;
    let locations = load_document(&archive, path, Some(wld), &DecodeOptions::default())?;
    let model_doc = match models {
        Some(models_path) => {
            let models_archive = open_archive(models_path)?;
            Some(load_document(&models_archive, models_path, models_wld, &DecodeOptions::default())?)
        }
        None => None,
    };

    let mut builder = PlaceableBuilder::new(&locations);
    if let Some(doc) = &model_doc {
        builder = builder.with_models(doc);
    }
    let table = builder.build();

    if json {
        println!("{}", serde_json::to_string_pretty(&table)?);
        return Ok(());
    }

    for object in &table.objects {
        match object {
            Ok(p) => println!(
                "{:>6}  {:<24} mesh {:<6} at ({:.1}, {:.1}, {:.1}) rot ({:.0}, {:.0}, {:.0}) scale {:.2}",
                p.id,
                p.model,
                p.mesh_id,
                p.position[0],
                p.position[1],
                p.position[2],
                p.rotation[0],
                p.rotation[1],
                p.rotation[2],
                p.scale[0]
            ),
            Err(e) => println!("     -  {e}"),
        }
    }
    println!(
        "{} of {} objects placed, {} distinct models",
        table.placed().count(),
        table.len(),
        table.models().len()
    );
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match &cli.command {
        Command::List { archive } => cmd_list(archive),
        Command::Extract {
            archive,
            name,
            output,
        } => cmd_extract(archive, name, output.as_deref()),
        Command::Fragments {
            archive,
            wld,
            kind,
            json,
        } => cmd_fragments(archive, wld.as_deref(), *kind, *json),
        Command::Sprites {
            archive,
            wld,
            json,
            strict,
            keep_texture_parameters,
            no_verify_textures,
        } => {
            let mut flags = Vec::new();
            if *strict {
                flags.push("strict");
            }
            if *keep_texture_parameters {
                flags.push("keep-texture-parameters");
            }
            if *no_verify_textures {
                flags.push("no-verify-textures");
            }
            cmd_sprites(archive, wld.as_deref(), *json, &DecodeOptions::from_flags(&flags))
        }
        Command::Placeables {
            archive,
            wld,
            models,
            models_wld,
            json,
        } => cmd_placeables(archive, wld, models.as_deref(), models_wld.as_deref(), *json),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_codes() {
        assert_eq!(parse_type_code("0x36"), Ok(0x36));
        assert_eq!(parse_type_code("49"), Ok(49));
        assert!(parse_type_code("0xZZ").is_err());
    }

    #[test]
    fn wld_name_follows_archive_stem() {
        assert_eq!(default_wld_name(Path::new("/eq/GFayDark.s3d")).unwrap(), "gfaydark.wld");
    }

    #[test]
    fn placeables_default_to_objects_file() {
        let cli = Cli::try_parse_from(["wldtool", "placeables", "gfaydark.s3d", "--models", "gfaydark_obj.s3d"]).unwrap();
        match cli.command {
            Command::Placeables { wld, models, models_wld, .. } => {
                assert_eq!(wld, "objects.wld");
                assert_eq!(models.as_deref(), Some(Path::new("gfaydark_obj.s3d")));
                assert_eq!(models_wld, None);
            }
            _ => panic!("expected placeables"),
        }
    }

    #[test]
    fn cli_parses_sprites() {
        let cli = Cli::try_parse_from(["wldtool", "sprites", "zone.s3d", "--json", "--strict"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Sprites {
                json: true,
                strict: true,
                ..
            }
        ));
    }
}

//! Renders a [`Manifest`] as a TypeScript module.

use std::{
    fmt::{self, Display, Write as _},
    io::{self, Write},
};

use crate::{
    classify::AssetType,
    manifest::{AnimationBundle, Manifest},
};

/// Module providing `TypesafeLoader`, relative to the generated file.
pub const LOADER_MODULE: &str = "../library/typesafe_loader";

/// Settings that only affect the text of the generated module.
#[derive(Clone, Copy, Debug)]
pub struct EmitOptions<'options> {
    /// Name of the config file, mentioned in the header comment.
    pub source_name: &'options str,
    /// Import path of the module providing `TypesafeLoader`.
    pub loader_module: &'options str,
}

/// Writes `manifest` as a TypeScript module to `out`.
///
/// # Errors
///
/// Fails if writing to `out` fails.
pub fn emit(
    out: &mut impl Write,
    manifest: &Manifest,
    options: &EmitOptions<'_>,
) -> io::Result<()> {
    emit_header(out, options)?;
    emit_types(out, manifest)?;

    writeln!(out, "export const AssetsToLoad = {{")?;
    if manifest.is_empty() {
        writeln!(out, "  // No files found!")?;
    } else {
        emit_assets(out, manifest)?;
        emit_animations(out, manifest)?;
    }
    writeln!(out, "}};")?;
    writeln!(out)?;

    writeln!(out, "export const Assets = new TypesafeLoader(AssetsToLoad);")?;

    Ok(())
}

fn emit_header(out: &mut impl Write, options: &EmitOptions<'_>) -> io::Result<()> {
    let EmitOptions {
        source_name,
        loader_module,
    } = *options;

    writeln!(
        out,
        "// THIS FILE IS AUTOGENERATED from the parameters in {source_name}. Do not edit it."
    )?;
    writeln!(
        out,
        "// If you want to change something about how it's generated, look at the asset-compiler tool."
    )?;
    writeln!(out)?;
    writeln!(
        out,
        "import {{ TypesafeLoader }} from {loader};",
        loader = quoted(loader_module)
    )?;
    writeln!(out)?;

    Ok(())
}

fn emit_types(out: &mut impl Write, manifest: &Manifest) -> io::Result<()> {
    writeln!(out, "export type AssetType =")?;
    for typ in AssetType::ALL {
        writeln!(out, "  | {}", quoted(typ.name()))?;
    }
    writeln!(out)?;

    writeln!(out, "export type AssetName = keyof typeof AssetsToLoad")?;
    writeln!(out, "export type AssetPath =")?;
    let mut paths = manifest.paths().peekable();
    if paths.peek().is_none() {
        // an empty union does not compile
        writeln!(out, "  | void")?;
    }
    for path in paths {
        writeln!(out, "  | {}", quoted(path))?;
    }
    writeln!(out)?;

    Ok(())
}

fn emit_assets(out: &mut impl Write, manifest: &Manifest) -> io::Result<()> {
    let name_width = column_width(manifest.assets.iter().map(|asset| asset.name.as_str()));
    let path_width = column_width(manifest.assets.iter().map(|asset| asset.path.as_str()));
    // widest type a single file can have, so the column does not move when assets change
    let type_width = quoted(AssetType::TileWorld.name()).len();

    for asset in &manifest.assets {
        writeln!(
            out,
            "  {name:<name_width$}: {{ type: {typ:<type_width$} as const, path: {path:<path_width$} }},",
            name = quoted(&asset.name),
            typ = quoted(asset.typ.name()),
            path = quoted(&asset.path),
        )?;
    }

    Ok(())
}

fn emit_animations(out: &mut impl Write, manifest: &Manifest) -> io::Result<()> {
    if manifest.animations.is_empty() {
        return Ok(());
    }

    writeln!(out)?;
    writeln!(out, "  /* Animations */")?;
    writeln!(out)?;

    manifest
        .animations
        .iter()
        .try_for_each(|(name, bundle)| emit_animation(out, name, bundle))
}

fn emit_animation(out: &mut impl Write, name: &str, bundle: &AnimationBundle) -> io::Result<()> {
    writeln!(out, "  {}: {{", quoted(name))?;
    writeln!(
        out,
        "    type: {} as const,",
        quoted(AssetType::Animation.name())
    )?;
    writeln!(out, "    paths: [")?;
    for frame in bundle.frames() {
        writeln!(out, "      {},", quoted(frame))?;
    }
    writeln!(out, "    ],")?;
    writeln!(out, "  }},")?;

    Ok(())
}

/// Width of the widest quoted value, in characters.
fn column_width<'value>(values: impl Iterator<Item = &'value str>) -> usize {
    values
        .map(|value| quoted(value).chars().count())
        .max()
        .unwrap_or(0)
}

/// `value` as a double quoted JavaScript string literal.
fn quoted(value: &str) -> String {
    format!("\"{}\"", JsStringDisplay(value))
}

struct JsStringDisplay<'inner>(&'inner str);

impl Display for JsStringDisplay<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for character in self.0.chars() {
            match character {
                '"' => formatter.write_str("\\\"")?,
                '\\' => formatter.write_str("\\\\")?,
                '\n' => formatter.write_str("\\n")?,
                '\r' => formatter.write_str("\\r")?,
                '\t' => formatter.write_str("\\t")?,
                control if control.is_control() => {
                    write!(formatter, "\\u{{{:x}}}", u32::from(control))?;
                }
                other => formatter.write_char(other)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::match_frame;

    const OPTIONS: EmitOptions<'static> = EmitOptions {
        source_name: "config.json",
        loader_module: LOADER_MODULE,
    };

    const HEADER: &str = r#"// THIS FILE IS AUTOGENERATED from the parameters in config.json. Do not edit it.
// If you want to change something about how it's generated, look at the asset-compiler tool.

import { TypesafeLoader } from "../library/typesafe_loader";

export type AssetType =
  | "Image"
  | "TileMap"
  | "TileWorld"
  | "Audio"
  | "Spritesheet"
  | "Animation"

export type AssetName = keyof typeof AssetsToLoad
export type AssetPath =
"#;

    fn render(manifest: &Manifest) -> String {
        let mut out = Vec::new();
        emit(&mut out, manifest, &OPTIONS).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn empty_manifest_has_placeholder() {
        let expected = format!(
            "{HEADER}  | void

export const AssetsToLoad = {{
  // No files found!
}};

export const Assets = new TypesafeLoader(AssetsToLoad);
"
        );

        assert_eq!(render(&Manifest::default()), expected);
    }

    #[test]
    fn populated_manifest() {
        let mut manifest = Manifest::default();
        manifest.add_asset(AssetType::Image, "hero.png".into());
        manifest.add_asset(AssetType::Audio, "sfx/jump.mp3".into());
        for path in ["foo_3.png", "foo_1.png", "foo_0.png"] {
            manifest.add_frame(match_frame(path).unwrap(), path.into());
        }

        let expected = format!(
            r#"{HEADER}  | "hero.png"
  | "sfx/jump.mp3"
  | "foo_0.png"
  | "foo_1.png"
  | "foo_3.png"

export const AssetsToLoad = {{
  "hero"    : {{ type: "Image"     as const, path: "hero.png"     }},
  "sfx/jump": {{ type: "Audio"     as const, path: "sfx/jump.mp3" }},

  /* Animations */

  "foo": {{
    type: "Animation" as const,
    paths: [
      "foo_0.png",
      "foo_1.png",
      "foo_3.png",
    ],
  }},
}};

export const Assets = new TypesafeLoader(AssetsToLoad);
"#
        );

        assert_eq!(render(&manifest), expected);
    }

    #[test]
    fn escapes_string_literals() {
        assert_eq!(quoted(r#"say "hi"\now"#), r#""say \"hi\"\\now""#);
        assert_eq!(quoted("tab\there"), r#""tab\there""#);
    }
}

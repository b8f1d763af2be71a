use std::collections::BTreeSet;

use crate::asset::AssetRef;
use crate::scene::{MagFilter, MinFilter, TextureParameters, Wrap};

/// Sampling configuration and image source declared next to a texture uniform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SamplerHint {
    pub name: String,
    pub source: AssetRef,
    pub parameters: TextureParameters,
}

/// Collects texture declarations and their trailing `///` hint comments.
///
/// Recognized declarations:
/// - GLSL: `uniform [precision] sampler2D name; /// hints`
/// - WGSL: `[@attrs] var name: texture_2d<f32>; /// hints`
///
/// Hints are `key:value` pairs separated by `;`:
/// `min` (n, l, nn, ln, nl, ll), `mag` (n, l), `s`/`t` (r, c, m), `mip`,
/// `aniso`, `srgb` (1/on/true), `src`. A `src` with a URI scheme is a location,
/// anything else an alias; without `src` the uniform name is the alias.
/// Only names in `active` are returned, in declaration order.
pub fn parse_sampler_hints(source: &str, active: &BTreeSet<String>) -> Vec<SamplerHint> {
    let mut out: Vec<SamplerHint> = Vec::new();

    for line in source.lines() {
        let (decl, comment) = match line.split_once("///") {
            Some((decl, comment)) => (decl, comment),
            None => (line, ""),
        };

        let Some(name) = glsl_sampler_name(decl).or_else(|| wgsl_texture_name(decl)) else {
            continue;
        };
        if !active.contains(name) || out.iter().any(|h| h.name == name) {
            continue;
        }

        out.push(hint_for(name, comment));
    }

    out
}

fn hint_for(name: &str, comment: &str) -> SamplerHint {
    let mut params = TextureParameters::DEFAULT;
    let mut src: Option<&str> = None;

    for pair in comment.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let Some((key, value)) = pair.split_once(':') else {
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "min" => params.min_filter = min_filter(value),
            "mag" => params.mag_filter = mag_filter(value),
            "s" => params.wrap_s = wrap(value),
            "t" => params.wrap_t = wrap(value),
            "mip" => params.mipmaps = is_true(value),
            "aniso" => match value.parse::<f32>() {
                Ok(level) if level >= 1.0 => params.anisotropy = Some(level as u16),
                _ => log::debug!("ignoring anisotropy '{value}' for '{name}'"),
            },
            "srgb" => params.srgb = is_true(value),
            "src" => src = Some(value),
            other => log::debug!("unknown sampler hint '{other}' for '{name}'"),
        }
    }

    let source = match src {
        Some(src) => AssetRef::parse(src),
        None => AssetRef::alias(name),
    };

    SamplerHint {
        name: name.to_string(),
        source,
        parameters: params,
    }
}

fn glsl_sampler_name(decl: &str) -> Option<&str> {
    let body = decl.trim().strip_suffix(';')?;
    let mut tokens = body.split_whitespace();
    if tokens.next()? != "uniform" {
        return None;
    }

    let rest: Vec<&str> = tokens.collect();
    let (name, types) = rest.split_last()?;
    let (ty, precision) = types.split_last()?;
    let precision_ok = match precision {
        [] => true,
        [p] => matches!(*p, "lowp" | "mediump" | "highp"),
        _ => false,
    };

    (precision_ok && ty.starts_with("sampler") && is_identifier(name)).then_some(*name)
}

fn wgsl_texture_name(decl: &str) -> Option<&str> {
    let body = decl.trim().strip_suffix(';')?;
    let (_, var) = body.split_once("var ")?;
    let (name, ty) = var.split_once(':')?;
    let name = name.trim();

    (ty.trim().starts_with("texture_2d") && is_identifier(name)).then_some(name)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_true(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("on") || value.eq_ignore_ascii_case("true")
}

fn min_filter(v: &str) -> MinFilter {
    match v {
        "n" => MinFilter::Nearest,
        "nn" => MinFilter::NearestMipmapNearest,
        "ln" => MinFilter::LinearMipmapNearest,
        "nl" => MinFilter::NearestMipmapLinear,
        "ll" => MinFilter::LinearMipmapLinear,
        _ => MinFilter::Linear,
    }
}

fn mag_filter(v: &str) -> MagFilter {
    match v {
        "n" => MagFilter::Nearest,
        _ => MagFilter::Linear,
    }
}

fn wrap(v: &str) -> Wrap {
    match v {
        "r" => Wrap::Repeat,
        "m" => Wrap::MirroredRepeat,
        _ => Wrap::ClampToEdge,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    // ── declarations ──────────────────────────────────────────────────────

    #[test]
    fn glsl_declaration_with_hints() {
        let src = "uniform mediump sampler2D noise; /// min:n;mag:n;s:r;t:m;src:db://noise";
        let hints = parse_sampler_hints(src, &active(&["noise"]));

        assert_eq!(hints.len(), 1);
        let hint = &hints[0];
        assert_eq!(hint.name, "noise");
        assert_eq!(hint.source, AssetRef::location("db://noise"));
        assert_eq!(hint.parameters.min_filter, MinFilter::Nearest);
        assert_eq!(hint.parameters.mag_filter, MagFilter::Nearest);
        assert_eq!(hint.parameters.wrap_s, Wrap::Repeat);
        assert_eq!(hint.parameters.wrap_t, Wrap::MirroredRepeat);
    }

    #[test]
    fn wgsl_declaration_with_attributes() {
        let src = "@group(0) @binding(2) var pebbles: texture_2d<f32>; /// srgb:on; mip:1; aniso:4; src:pebbles.png";
        let hints = parse_sampler_hints(src, &active(&["pebbles"]));

        assert_eq!(hints.len(), 1);
        assert_eq!(hints[0].source, AssetRef::alias("pebbles.png"));
        assert!(hints[0].parameters.srgb);
        assert!(hints[0].parameters.mipmaps);
        assert_eq!(hints[0].parameters.anisotropy, Some(4));
    }

    #[test]
    fn missing_comment_uses_defaults_and_name_alias() {
        let hints = parse_sampler_hints("uniform sampler2D tex;", &active(&["tex"]));
        assert_eq!(hints[0].source, AssetRef::alias("tex"));
        assert_eq!(hints[0].parameters, TextureParameters::DEFAULT);
    }

    // ── filtering ─────────────────────────────────────────────────────────

    #[test]
    fn inactive_and_non_sampler_uniforms_are_skipped() {
        let src = "uniform sampler2D unused; /// src:a\nuniform float time; /// src:b\nvar<uniform> u: Globals;";
        let hints = parse_sampler_hints(src, &active(&["time", "u"]));
        assert!(hints.is_empty());
    }

    #[test]
    fn unknown_codes_fall_back_to_defaults() {
        let src = "uniform sampler2D tex; /// min:zz; s:q; bogus:1; aniso:x";
        let hint = &parse_sampler_hints(src, &active(&["tex"]))[0];
        assert_eq!(hint.parameters.min_filter, MinFilter::Linear);
        assert_eq!(hint.parameters.wrap_s, Wrap::ClampToEdge);
        assert_eq!(hint.parameters.anisotropy, None);
    }
}

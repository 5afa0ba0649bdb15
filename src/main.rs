use std::env;
use std::fs;

use anyhow::{anyhow, Context, Result};

use ripple_forward::{
    render_preview, EnvironmentState, MaterialDef, MaterialLibrary, PreviewOptions,
};

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;

    let library = match &options.material_path {
        Some(path) => {
            let xml = fs::read_to_string(path)
                .with_context(|| format!("failed to read material file {path}"))?;
            MaterialLibrary::from_xml(&xml)
                .with_context(|| format!("failed to parse material file {path}"))?
        }
        None => MaterialLibrary {
            materials: vec![MaterialDef {
                name: "default".to_string(),
                ..MaterialDef::default()
            }],
        },
    };

    println!("Loaded {} material(s)", library.materials.len());
    for material in &library.materials {
        println!(
            " - {} emissive=({:.2}, {:.2}, {:.2}, {:.2}) effect=({:.2}, {:.2})",
            material.name,
            material.emissive.x,
            material.emissive.y,
            material.emissive.z,
            material.emissive.w,
            material.effect.x,
            material.effect.y
        );
    }

    let material = match &options.material_name {
        Some(name) => library
            .get(name)
            .ok_or_else(|| anyhow!("no material named {name:?}"))?,
        None => library
            .materials
            .first()
            .ok_or_else(|| anyhow!("material library is empty"))?,
    };

    let environment = EnvironmentState::new().snapshot();
    let (width, height) = options.size;
    let preview = render_preview(
        &PreviewOptions {
            width,
            height,
            background: environment.background_color,
        },
        &material.params(),
    );
    preview
        .save(&options.output)
        .with_context(|| format!("failed to write {}", options.output))?;

    println!(
        "Rendered {width}x{height} preview of {:?} to {}",
        material.name, options.output
    );
    Ok(())
}

struct CliOptions {
    material_path: Option<String>,
    material_name: Option<String>,
    output: String,
    size: (u32, u32),
}

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut material_path = None;
        let mut material_name = None;
        let mut output = "preview.png".to_string();
        let mut size = (256, 256);

        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--material" => {
                    material_name =
                        Some(args.next().ok_or_else(|| anyhow!("--material needs a name"))?);
                }
                "--output" => {
                    output = args.next().ok_or_else(|| anyhow!("--output needs a path"))?;
                }
                "--size" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--size needs WIDTHxHEIGHT"))?;
                    size = parse_size(&value)?;
                }
                other if other.starts_with("--") => {
                    return Err(anyhow!(
                        "Unknown argument: {other}. Expected --material, --output or --size"
                    ));
                }
                other => {
                    if material_path.is_some() {
                        return Err(anyhow!(
                            "Usage: ripple-forward [materials.xml] [--material NAME] [--output PATH] [--size WxH]"
                        ));
                    }
                    material_path = Some(other.to_string());
                }
            }
        }

        Ok(Self {
            material_path,
            material_name,
            output,
            size,
        })
    }
}

fn parse_size(value: &str) -> Result<(u32, u32)> {
    let Some((width, height)) = value.split_once('x') else {
        return Err(anyhow!("expected WIDTHxHEIGHT, got {value}"));
    };
    let width = width.parse::<u32>().context("invalid width")?;
    let height = height.parse::<u32>().context("invalid height")?;
    if width == 0 || height == 0 {
        return Err(anyhow!("preview size must be non-zero"));
    }
    Ok((width, height))
}

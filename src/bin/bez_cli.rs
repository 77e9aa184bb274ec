#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(all(not(target_arch = "wasm32"), not(feature = "cli")))]
fn main() {
    eprintln!(
        "bez_cli is a native-only tool and requires `--features cli`.\n\
         Example: cargo run --bin bez_cli --features cli -- model.bez 0.01 -a"
    );
    std::process::exit(1);
}

#[cfg(all(not(target_arch = "wasm32"), feature = "cli"))]
fn main() {
    env_logger::init();
    if let Err(err) = native::run() {
        eprintln!("bez_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(all(not(target_arch = "wasm32"), feature = "cli"))]
mod native {
    use bez_engine::geom::{
        DEFAULT_STEP, GeomContext, TessellationConfig, TimingBucket, mesh_patches_with_context,
    };
    use bez_engine::parse::{parse_file, write_bez};
    use std::fs;
    use std::path::{Path, PathBuf};

    const DEFAULT_MAX_DEPTH: usize = 8;

    const USAGE: &str = r#"bez_cli (bez-engine)

USAGE:
  bez_cli <input.bez> [<param>] [-a] [options]

  <param> is the uniform step (default 16), or with -a the adaptive
  tolerance (required).

OPTIONS:
  -a, --adaptive       Adaptive tessellation instead of a uniform grid
  --step <n>           Uniform step (cells per side)
  --tolerance <t>      Adaptive flatness tolerance (implies -a)
  --max-depth <d>      Adaptive recursion limit (default 8)
  --wireframe          Emit triangle edges as lines
  --flat               Flat shading (one normal per triangle)
  --obj <path>         Write the mesh as Wavefront OBJ
  --write-bez <path>   Write the parsed patches back in .bez layout
  --overwrite          Overwrite existing output files
  -h, --help           Show this help

Set RUST_LOG=debug for per-patch logging.
"#;

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let mut input: Option<PathBuf> = None;
        let mut param: Option<String> = None;
        let mut step: Option<usize> = None;
        let mut tolerance: Option<f64> = None;
        let mut max_depth = DEFAULT_MAX_DEPTH;
        let mut adaptive = false;
        let mut wireframe = false;
        let mut flat = false;
        let mut obj_path: Option<PathBuf> = None;
        let mut bez_path: Option<PathBuf> = None;
        let mut overwrite = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "-a" | "--adaptive" => adaptive = true,
                "--step" => step = Some(parse_number("--step", &args.value("--step")?)?),
                "--tolerance" => {
                    tolerance = Some(parse_number("--tolerance", &args.value("--tolerance")?)?);
                    adaptive = true;
                }
                "--max-depth" => {
                    max_depth = parse_number("--max-depth", &args.value("--max-depth")?)?;
                }
                "--wireframe" => wireframe = true,
                "--flat" => flat = true,
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--write-bez" => bez_path = Some(PathBuf::from(args.value("--write-bez")?)),
                "--overwrite" => overwrite = true,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other if other.starts_with("--") => {
                    return Err(format!("unknown option `{other}`\n\n{USAGE}"));
                }
                positional if input.is_none() => input = Some(PathBuf::from(positional)),
                positional if param.is_none() => param = Some(positional.to_string()),
                other => return Err(format!("unexpected argument `{other}`\n\n{USAGE}")),
            }
        }

        let Some(input) = input else {
            print_usage();
            return Ok(());
        };

        let mode = if adaptive {
            let tolerance = match (tolerance, param.as_deref()) {
                (Some(t), _) => t,
                (None, Some(p)) => parse_number("<param>", p)?,
                (None, None) => return Err("adaptive mode needs a tolerance".to_string()),
            };
            TessellationConfig::adaptive(tolerance, max_depth)
        } else {
            let step = match (step, param.as_deref()) {
                (Some(s), _) => s,
                (None, Some(p)) => parse_number("<param>", p)?,
                (None, None) => DEFAULT_STEP,
            };
            TessellationConfig::uniform(step)
        };
        let config = mode.with_wireframe(wireframe).with_flat_shading(flat);
        config.validate().map_err(|e| format!("invalid settings: {e}"))?;

        let mut ctx = GeomContext::new();
        ctx.metrics.begin();
        let patches = ctx
            .metrics
            .time(TimingBucket::Parse, || parse_file(&input))
            .map_err(|e| format!("{}: {e}", input.display()))?;

        let (mesh, diagnostics) =
            mesh_patches_with_context(&patches, &config, &mut ctx).map_err(|e| e.to_string())?;

        if let Some(path) = obj_path.as_deref() {
            mesh.validate()
                .map_err(|e| format!("mesh validation failed: {e}"))?;
            let name = input
                .file_stem()
                .map_or_else(|| "bez".to_string(), |s| s.to_string_lossy().into_owned());
            write_text_file(path, &mesh.to_obj(&name), overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        if let Some(path) = bez_path.as_deref() {
            write_text_file(path, &write_bez(&patches), overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        eprintln!("{}: {}", input.display(), diagnostics.summary());
        for warning in &diagnostics.warnings {
            eprintln!("warning: {warning}");
        }
        if let Some(timing) = diagnostics.timing.as_ref() {
            eprintln!(
                "timing: parse={}ns uniform={}ns adaptive={}ns assembly={}ns total={:.3}ms",
                timing.parse_ns,
                timing.uniform_tessellation_ns,
                timing.adaptive_tessellation_ns,
                timing.mesh_assembly_ns,
                timing.total_ms()
            );
        }

        Ok(())
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn parse_number<T: std::str::FromStr>(flag: &str, value: &str) -> Result<T, String>
    where
        T::Err: std::fmt::Display,
    {
        value
            .parse()
            .map_err(|e| format!("invalid value `{value}` for {flag}: {e}"))
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| format!("create dir {}: {e}", parent.display()))?;
            }
        }
        fs::write(path, text).map_err(|e| format!("write {}: {e}", path.display()))
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}

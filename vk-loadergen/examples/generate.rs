use std::{
    error::Error,
    fmt,
    fs::File,
    io::BufWriter,
    path::PathBuf,
};

use vk_loadergen::{loader, Artifact, GeneratorOptions};

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let mut args = std::env::args().skip(1).map(PathBuf::from);
    let path = args.next().ok_or(MissingArgumentError("XML_PATH"))?;
    let out_dir = args.next().unwrap_or_else(|| PathBuf::from("."));

    let options = GeneratorOptions::loader(Artifact::LoaderHeader.filename());
    let (mut registry, errors) = vk_loadergen::parse_file(path.as_ref(), &options)?;
    errors.into_iter().for_each(|e| {
        eprintln!("non-fatal error while parsing registry: {}", &e);
    });

    for artifact in Artifact::ALL.iter() {
        let out_path = out_dir.join(artifact.filename());
        let out = BufWriter::new(File::create(&out_path)?);
        let (_, errors) = loader::generate(&mut registry, *artifact, out)?;
        errors.into_iter().for_each(|e| {
            eprintln!("non-fatal error while generating {}: {}", artifact.filename(), &e);
        });
        println!("wrote {}", out_path.display());
    }
    Ok(())
}

#[derive(Debug, Clone, Copy)]
#[repr(transparent)]
struct MissingArgumentError<'a>(&'a str);

impl<'a> fmt::Display for MissingArgumentError<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "missing required argument: {}", self.0)
    }
}

impl<'a> Error for MissingArgumentError<'a> {}

#![deny(warnings)]

extern crate minreq;
extern crate ron;
extern crate serde;
extern crate vk_loadergen;

use vk_loadergen::{loader, Artifact, GeneratorOptions, Registry};

const URL_REPO: &str = "https://raw.githubusercontent.com/KhronosGroup/Vulkan-Docs";
const URL_MAIN: &str = "https://raw.githubusercontent.com/KhronosGroup/Vulkan-Docs/main/xml/vk.xml";

fn download<T: std::io::Write>(dst: &mut T, url: &str) {
    let resp = minreq::get(url)
        .send()
        .expect(&format!("Failed to GET resource: {:?}", url));

    let is_success = 200 <= resp.status_code && resp.status_code < 300;
    if !is_success {
        panic!(
            "Download request failed with status: {:?}",
            resp.status_code
        )
    }

    dst.write_all(resp.as_bytes())
        .expect("Failed to write response body.");
}

#[cfg(feature = "serialize")]
fn write_features(path: &str, reg: &Registry) {
    use std::io::Write;

    let mut file = std::io::BufWriter::new(std::fs::File::create(path).unwrap());
    let text = ron::ser::to_string_pretty(&reg.selected_features(), ron::ser::PrettyConfig::default()).unwrap();
    writeln!(&mut file, "{}", text).unwrap();
}

fn check_guards(name: &str, text: &str) {
    let mut open = Vec::new();
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("#if defined(") {
            open.push(rest.trim_end_matches(')'));
        } else if let Some(rest) = line.strip_prefix("#endif // ") {
            assert_eq!(open.pop(), Some(rest), "{}", name);
        }
    }
    assert!(open.is_empty(), "{}: unclosed {:?}", name, open);
}

fn generation_test(buf: std::io::Cursor<Vec<u8>>) -> Registry {
    let options = GeneratorOptions::loader(Artifact::LoaderHeader.filename());
    let mut reg = match vk_loadergen::parse_stream(buf, &options) {
        Ok((reg, errors)) => {
            if !errors.is_empty() {
                panic!("{:?}", errors);
            }
            reg
        }
        Err(fatal_error) => panic!("{:?}", fatal_error),
    };

    for artifact in Artifact::ALL.iter() {
        let mut texts = Vec::new();
        for _ in 0..2 {
            match loader::generate(&mut reg, *artifact, Vec::new()) {
                Ok((out, errors)) => {
                    errors
                        .iter()
                        .for_each(|e| eprintln!("{}: {}", artifact.filename(), e));
                    texts.push(String::from_utf8(out).unwrap());
                }
                Err(fatal_error) => panic!("{:?}", fatal_error),
            }
        }
        assert_eq!(texts[0], texts[1], "{} is not reproducible", artifact.filename());
        check_guards(artifact.filename(), &texts[0]);
    }
    reg
}

fn parsing_test(major: u32, minor: u32, patch: u32, url_suffix: &str) {
    let src = format!(
        "{}/v{}.{}.{}{}/vk.xml",
        URL_REPO, major, minor, patch, url_suffix
    );
    use std::io::Cursor;
    let mut buf = Cursor::new(Vec::new());
    download(&mut buf, &src);
    buf.set_position(0);
    generation_test(buf);
}

macro_rules! test_version {
    ($test_name:ident, $major:expr, $minor:expr, $patch:expr, $url_suffix:expr) => {
        #[test]
        fn $test_name() {
            parsing_test($major, $minor, $patch, $url_suffix);
        }
    };
}

#[test]
fn test_main() {
    use std::io::Cursor;
    let mut buf = Cursor::new(Vec::new());
    download(&mut buf, URL_MAIN);
    buf.set_position(0);
    let _reg = generation_test(buf);
    #[cfg(feature = "serialize")]
    write_features("main.ron", &_reg);
}

test_version! {test_v1_3_250, 1, 3, 250, "/xml"}
test_version! {test_v1_3_280, 1, 3, 280, "/xml"}
test_version! {test_v1_3_300, 1, 3, 300, "/xml"}
test_version! {test_v1_4_303, 1, 4, 303, "/xml"}
test_version! {test_v1_4_310, 1, 4, 310, "/xml"}
test_version! {test_v1_4_317, 1, 4, 317, "/xml"}

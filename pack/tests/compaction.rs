//! Tests of the compactor on hand-written sources.

use std::io::{self, BufRead, BufReader, Read};

use pretty_assertions::assert_eq;

use shadeport_back::{DialectVersion, EsVersion, FullVersion};
use shadeport_pack::{Compactor, ContentHash};

const ES100: DialectVersion = DialectVersion::Embedded(EsVersion::V100);
const ES300: DialectVersion = DialectVersion::Embedded(EsVersion::V300);
const GL120: DialectVersion = DialectVersion::Full(FullVersion::V120);
const GL330: DialectVersion = DialectVersion::Full(FullVersion::V330);

const LEGACY: &str = indoc::indoc! {"
    varying vec2 uv;

    void main() {
        gl_FragColor = vec4(uv, 0.0, 1.0);
    }
"};

/// The same text as [`LEGACY`] apart from comments and layout.
const LEGACY_COMMENTED: &str = indoc::indoc! {"
    // fragment shader `flat` for GLSL 1.20
    varying   vec2 uv; /* interpolated
       by the rasterizer */

    void main() {
            gl_FragColor = vec4(uv, 0.0, 1.0); // opaque
    }
"};

const MODERN: &str = indoc::indoc! {"
    in vec2 uv;
    out vec4 color;

    void main() {
        color = vec4(uv, 0.0, 1.0);
    }
"};

fn compact<'a>(
    sources: impl IntoIterator<Item = (DialectVersion, &'a str)>,
) -> shadeport_pack::CompactedSources {
    Compactor::new()
        .compact(
            sources
                .into_iter()
                .map(|(version, text)| (version, text.as_bytes())),
        )
        .unwrap()
}

#[test]
fn comment_and_layout_differences_share_a_blob() {
    let compacted = compact([
        (ES100, LEGACY),
        (GL120, LEGACY_COMMENTED),
        (ES300, MODERN),
        (GL330, MODERN),
    ]);
    assert_eq!(compacted.unique(), 2);
    assert_eq!(compacted.versions.len(), 4);
    assert_eq!(compacted.versions[&ES100], compacted.versions[&GL120]);
    assert_eq!(compacted.versions[&ES300], compacted.versions[&GL330]);
    assert_ne!(compacted.versions[&ES100], compacted.versions[&ES300]);
}

#[test]
fn lines_are_normalized() {
    let compacted = compact([(GL120, LEGACY_COMMENTED)]);
    assert_eq!(
        compacted.lines(GL120).unwrap(),
        [
            "varying vec2 uv;",
            "void main() {",
            "gl_FragColor = vec4(uv, 0.0, 1.0);",
            "}",
        ]
    );
    assert_eq!(compacted.lines(ES100), None);
}

#[test]
fn every_version_decompresses_to_its_own_text() {
    let sources = [(ES100, LEGACY), (GL120, LEGACY), (ES300, MODERN)];
    let compacted = compact(sources);
    for (version, text) in sources {
        let expected = shadeport_pack::normalize(text.as_bytes()).unwrap();
        assert_eq!(compacted.lines(version), Some(expected.as_slice()), "{version}");
    }
    assert_eq!(
        compacted.text(ES300).unwrap(),
        "in vec2 uv;\nout vec4 color;\nvoid main() {\ncolor = vec4(uv, 0.0, 1.0);\n}\n"
    );
}

#[test]
fn order_follows_input() {
    let compacted = compact([(GL330, MODERN), (ES100, LEGACY), (ES300, MODERN)]);
    assert_eq!(
        compacted.versions.keys().copied().collect::<Vec<_>>(),
        [GL330, ES100, ES300]
    );
    let first_blob: &ContentHash = compacted.blobs.keys().next().unwrap();
    assert_eq!(*first_blob, compacted.versions[&GL330]);
    assert_eq!(first_blob.to_string().len(), 64);
}

#[test]
fn empty_input() {
    let compacted = compact(Vec::new());
    assert_eq!(compacted.unique(), 0);
    assert!(compacted.versions.is_empty());
}

struct Failing;

impl Read for Failing {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::other("disk on fire"))
    }
}

#[test]
fn read_errors_are_returned() {
    let sources: [(DialectVersion, Box<dyn BufRead>); 2] = [
        (ES100, Box::new(LEGACY.as_bytes())),
        (GL120, Box::new(BufReader::new(Failing))),
    ];
    let error = Compactor::new().compact(sources).unwrap_err();
    assert_eq!(error.to_string(), "disk on fire");
}

#[test]
fn invalid_utf8_is_an_error() {
    let error = Compactor::new()
        .compact([(ES100, &b"void main() {\xff}\n"[..])])
        .unwrap_err();
    assert_eq!(error.kind(), io::ErrorKind::InvalidData);
}

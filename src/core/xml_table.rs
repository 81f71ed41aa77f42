use crate::domain::model::{PostRow, XmlTable};
use crate::utils::error::{EtlError, Result};
use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

const POSTS_FILE: &str = "posts.xml";
const MAX_SEARCH_DEPTH: usize = 3;

fn open_reader(path: &Path) -> Result<Reader<BufReader<File>>> {
    if !path.is_file() {
        return Err(EtlError::InputNotFound {
            path: path.display().to_string(),
        });
    }
    Ok(Reader::from_reader(BufReader::new(File::open(path)?)))
}

/// Streams the document and calls `visit` for every direct child of the root.
fn for_each_row<R, F>(reader: &mut Reader<R>, mut visit: F) -> Result<usize>
where
    R: BufRead,
    F: FnMut(&BytesStart<'_>, Decoder) -> Result<()>,
{
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut rows = 0usize;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(element) => {
                if depth == 1 {
                    visit(&element, reader.decoder())?;
                    rows += 1;
                }
                depth += 1;
            }
            Event::Empty(element) => {
                if depth == 1 {
                    visit(&element, reader.decoder())?;
                    rows += 1;
                }
            }
            Event::End(_) => depth = depth.saturating_sub(1),
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(rows)
}

fn attributes(element: &BytesStart<'_>, decoder: Decoder) -> Result<Vec<(String, String)>> {
    element
        .attributes()
        .map(|attr| {
            let attr = attr?;
            let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
            let value = attr.decode_and_unescape_value(decoder)?.into_owned();
            Ok((key, value))
        })
        .collect()
}

fn table_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"))
}

/// Parses a dump XML file into a table named after the file stem.
pub fn parse_xml(path: &Path) -> Result<XmlTable> {
    let mut reader = open_reader(path)?;
    let mut table = XmlTable::new(table_name(path));

    for_each_row(&mut reader, |element, decoder| {
        table.push_row(attributes(element, decoder)?);
        Ok(())
    })?;

    tracing::debug!(
        "Parsed {} rows x {} columns from {}",
        table.len(),
        table.columns.len(),
        path.display()
    );
    Ok(table)
}

/// Parses every `.xml` file directly inside `directory`, keyed by table name.
pub fn parse_all_xmls(directory: &Path) -> Result<BTreeMap<String, XmlTable>> {
    if !directory.is_dir() {
        return Err(EtlError::InputNotFound {
            path: directory.display().to_string(),
        });
    }

    let mut tables = BTreeMap::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if path.is_file() && is_xml(&path) {
            let table = parse_xml(&path)?;
            tables.insert(table.name.clone(), table);
        }
    }
    Ok(tables)
}

/// Reads the `Id` and `Body` of every post. Rows without a body are skipped.
pub fn read_posts(path: &Path, site: &str) -> Result<Vec<PostRow>> {
    let mut reader = open_reader(path)?;
    let mut posts = Vec::new();

    let seen = for_each_row(&mut reader, |element, decoder| {
        let mut id = None;
        let mut body = None;
        for attr in element.attributes() {
            let attr = attr?;
            match attr.key.as_ref() {
                b"Id" => id = Some(attr.decode_and_unescape_value(decoder)?.into_owned()),
                b"Body" => body = Some(attr.decode_and_unescape_value(decoder)?.into_owned()),
                _ => {}
            }
        }
        if let Some(body) = body {
            posts.push(PostRow {
                site: site.to_string(),
                id: id.unwrap_or_default(),
                body,
            });
        }
        Ok(())
    })?;

    tracing::info!(
        "📄 {} posts with a body out of {} rows in {}",
        posts.len(),
        seen,
        path.display()
    );
    Ok(posts)
}

/// Site name of a posts file: the name of the directory holding it.
pub fn site_name(posts_file: &Path) -> String {
    posts_file
        .parent()
        .and_then(Path::file_name)
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Finds `Posts.xml` files (any case) under `directory`, sorted by path.
pub fn find_posts_files(directory: &Path) -> Result<Vec<PathBuf>> {
    if !directory.is_dir() {
        return Err(EtlError::InputNotFound {
            path: directory.display().to_string(),
        });
    }

    let mut found = Vec::new();
    let mut pending = vec![(directory.to_path_buf(), 0usize)];
    while let Some((dir, depth)) = pending.pop() {
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if path.is_dir() {
                if depth < MAX_SEARCH_DEPTH {
                    pending.push((path, depth + 1));
                }
            } else if path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.eq_ignore_ascii_case(POSTS_FILE))
            {
                found.push(path);
            }
        }
    }

    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const POSTS: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<posts>
  <row Id="1" PostTypeId="1" Title="What is dharma?" Body="&lt;p&gt;What is &lt;b&gt;dharma&lt;/b&gt;?&lt;/p&gt;&#xA;" />
  <row Id="2" PostTypeId="2" Body="&lt;p&gt;Dharma is duty.&lt;/p&gt;" />
  <row Id="3" PostTypeId="5" />
</posts>"#;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_parse_xml_rows_and_columns() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "Posts.xml", POSTS);

        let table = parse_xml(&path).unwrap();

        assert_eq!(table.name, "Posts");
        assert_eq!(table.len(), 3);
        assert_eq!(table.columns, vec!["Id", "PostTypeId", "Title", "Body"]);
        assert_eq!(table.cell(0, "Title"), "What is dharma?");
        assert_eq!(table.cell(1, "Title"), "");
        assert_eq!(table.cell(0, "Body"), "<p>What is <b>dharma</b>?</p>\n");
    }

    #[test]
    fn test_parse_xml_ignores_nested_elements() {
        let dir = TempDir::new().unwrap();
        let path = write(
            dir.path(),
            "Badges.xml",
            r#"<badges><row Id="1"><extra Id="99"/></row><row Id="2"/></badges>"#,
        );

        let table = parse_xml(&path).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(1, "Id"), "2");
    }

    #[test]
    fn test_parse_xml_empty_root() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "Tags.xml", "<tags/>");
        assert!(parse_xml(&path).unwrap().is_empty());
    }

    #[test]
    fn test_parse_xml_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "Votes.xml", r#"<votes><row Id="1" Id="2"/></votes>"#);
        assert!(parse_xml(&path).is_err());
    }

    #[test]
    fn test_parse_all_xmls_by_stem() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "Posts.xml", POSTS);
        write(dir.path(), "Tags.XML", r#"<tags><row Id="1" TagName="vedas"/></tags>"#);
        write(dir.path(), "readme.txt", "not xml");

        let tables = parse_all_xmls(dir.path()).unwrap();

        assert_eq!(tables.keys().collect::<Vec<_>>(), vec!["Posts", "Tags"]);
        assert_eq!(tables["Tags"].cell(0, "TagName"), "vedas");
    }

    #[test]
    fn test_read_posts_keeps_only_rows_with_body() {
        let dir = TempDir::new().unwrap();
        let path = write(dir.path(), "Posts.xml", POSTS);

        let posts = read_posts(&path, "hinduism").unwrap();

        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, "1");
        assert_eq!(posts[0].site, "hinduism");
        assert_eq!(posts[1].body, "<p>Dharma is duty.</p>");
    }

    #[test]
    fn test_read_posts_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_posts(&dir.path().join("Posts.xml"), "x").unwrap_err();
        assert!(matches!(err, EtlError::InputNotFound { .. }));
    }

    #[test]
    fn test_find_posts_files_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.stackexchange.com");
        let b = dir.path().join("b.stackexchange.com");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        write(&a, "Posts.xml", POSTS);
        write(&b, "posts.XML", POSTS);
        write(&b, "Comments.xml", "<comments/>");

        let found = find_posts_files(dir.path()).unwrap();

        assert_eq!(found.len(), 2);
        assert_eq!(site_name(&found[0]), "a.stackexchange.com");
        assert_eq!(site_name(&found[1]), "b.stackexchange.com");
    }
}

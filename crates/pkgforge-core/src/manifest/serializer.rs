//! Deterministic manifest rendering.

use quick_xml::escape::escape;

use crate::types::{MemberSet, TypeMap, WILDCARD};

/// Conventional file name of a deploy package.
pub const PACKAGE_FILE_NAME: &str = "package.xml";

/// Namespace of the metadata package schema.
pub const PACKAGE_NAMESPACE: &str = "http://soap.sforce.com/2006/04/metadata";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;
const INDENT: &str = "    ";

/// Render types and members as manifest XML.
///
/// Types and members come out in case-sensitive ascending order whatever
/// order they were collected in; a wildcard renders as the single member `*`.
pub fn serialize(types: &TypeMap, api_version: &str) -> String {
    let mut out = String::new();
    out.push_str(XML_DECLARATION);
    out.push('\n');
    out.push_str(&format!("<Package xmlns=\"{PACKAGE_NAMESPACE}\">\n"));

    for (type_name, members) in types {
        out.push_str(INDENT);
        out.push_str("<types>\n");
        match members {
            MemberSet::Wildcard => push_element(&mut out, 2, "members", WILDCARD),
            MemberSet::Explicit(names) => {
                for name in names {
                    push_element(&mut out, 2, "members", name);
                }
            }
        }
        push_element(&mut out, 2, "name", type_name);
        out.push_str(INDENT);
        out.push_str("</types>\n");
    }

    push_element(&mut out, 1, "version", api_version);
    out.push_str("</Package>\n");
    out
}

fn push_element(out: &mut String, depth: usize, tag: &str, text: &str) {
    for _ in 0..depth {
        out.push_str(INDENT);
    }
    out.push_str(&format!("<{tag}>{}</{tag}>\n", escape(text)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_manifest() {
        let xml = serialize(&TypeMap::new(), "58.0");
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
             <Package xmlns=\"http://soap.sforce.com/2006/04/metadata\">\n\
             \x20   <version>58.0</version>\n\
             </Package>\n"
        );
    }

    #[test]
    fn test_types_and_members_are_sorted() {
        let mut types = TypeMap::new();
        types.insert(
            "CustomObject".to_string(),
            MemberSet::Wildcard,
        );
        types.insert(
            "ApexClass".to_string(),
            MemberSet::explicit(["b", "B", "a"]).unwrap(),
        );

        let xml = serialize(&types, "58.0");

        let expected = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<Package xmlns=\"http://soap.sforce.com/2006/04/metadata\">
    <types>
        <members>B</members>
        <members>a</members>
        <members>b</members>
        <name>ApexClass</name>
    </types>
    <types>
        <members>*</members>
        <name>CustomObject</name>
    </types>
    <version>58.0</version>
</Package>
";
        assert_eq!(xml, expected);
    }

    #[test]
    fn test_member_names_are_escaped() {
        let mut types = TypeMap::new();
        types.insert(
            "EmailTemplate".to_string(),
            MemberSet::single("Folder/R&D <draft>"),
        );

        let xml = serialize(&types, "58.0");

        assert!(xml.contains("<members>Folder/R&amp;D &lt;draft&gt;</members>"));
    }
}

//! OMML linearization.
//!
//! Office math markup is flattened to an infix-like source string rather
//! than rendered: fractions become `(num)/(den)`, scripts become
//! `base^(exp)` and `base_(sub)`, radicals become `sqrt(expr)`. Anything
//! unrecognized contributes the linearization of its children, so no
//! math content is silently dropped.

use super::xml::XmlElement;

/// Linearize one `oMath` or `oMathPara` region.
pub fn linearize(element: &XmlElement) -> String {
    let mut out = String::new();
    for child in element.child_elements() {
        linearize_into(child, &mut out);
    }
    out
}

fn linearize_into(element: &XmlElement, out: &mut String) {
    match element.name.as_str() {
        "r" => {
            for t in element.children_named("t") {
                out.push_str(&t.text());
            }
        }
        "f" => {
            out.push('(');
            linearize_child(element, "num", out);
            out.push_str(")/(");
            linearize_child(element, "den", out);
            out.push(')');
        }
        "sSup" => {
            linearize_child(element, "e", out);
            out.push_str("^(");
            linearize_child(element, "sup", out);
            out.push(')');
        }
        "sSub" => {
            linearize_child(element, "e", out);
            out.push_str("_(");
            linearize_child(element, "sub", out);
            out.push(')');
        }
        "sSubSup" => {
            linearize_child(element, "e", out);
            out.push_str("_(");
            linearize_child(element, "sub", out);
            out.push_str(")^(");
            linearize_child(element, "sup", out);
            out.push(')');
        }
        "rad" => {
            out.push_str("sqrt(");
            linearize_child(element, "e", out);
            out.push(')');
        }
        "d" => {
            out.push('(');
            let mut first = true;
            for e in element.children_named("e") {
                if !first {
                    out.push_str(", ");
                }
                first = false;
                for child in e.child_elements() {
                    linearize_into(child, out);
                }
            }
            out.push(')');
        }
        // Property containers carry no visible content.
        "fPr" | "sSupPr" | "sSubPr" | "sSubSupPr" | "radPr" | "dPr"
        | "oMathParaPr" | "ctrlPr" | "rPr" | "argPr" | "deg" => {}
        _ => {
            for child in element.child_elements() {
                linearize_into(child, out);
            }
        }
    }
}

fn linearize_child(element: &XmlElement, name: &str, out: &mut String) {
    if let Some(child) = element.child(name) {
        for grandchild in child.child_elements() {
            linearize_into(grandchild, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::docx::xml::parse_part;

    fn omml(inner: &str) -> String {
        linearize(&parse_part(format!("<m:oMath xmlns:m=\"ns\">{inner}</m:oMath>").as_bytes()).unwrap())
    }

    #[test]
    fn test_plain_runs_concatenate() {
        assert_eq!(omml("<m:r><m:t>x</m:t></m:r><m:r><m:t>+1</m:t></m:r>"), "x+1");
    }

    #[test]
    fn test_fraction() {
        let inner = "<m:f><m:num><m:r><m:t>a</m:t></m:r></m:num><m:den><m:r><m:t>b</m:t></m:r></m:den></m:f>";
        assert_eq!(omml(inner), "(a)/(b)");
    }

    #[test]
    fn test_superscript_and_subscript() {
        let sup = "<m:sSup><m:e><m:r><m:t>x</m:t></m:r></m:e><m:sup><m:r><m:t>2</m:t></m:r></m:sup></m:sSup>";
        assert_eq!(omml(sup), "x^(2)");
        let sub = "<m:sSub><m:e><m:r><m:t>a</m:t></m:r></m:e><m:sub><m:r><m:t>n</m:t></m:r></m:sub></m:sSub>";
        assert_eq!(omml(sub), "a_(n)");
    }

    #[test]
    fn test_radical() {
        let inner = "<m:rad><m:radPr/><m:deg/><m:e><m:r><m:t>x</m:t></m:r></m:e></m:rad>";
        assert_eq!(omml(inner), "sqrt(x)");
    }

    #[test]
    fn test_unknown_structure_keeps_content() {
        let inner = "<m:future><m:r><m:t>kept</m:t></m:r></m:future>";
        assert_eq!(omml(inner), "kept");
    }
}

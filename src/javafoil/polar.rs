//! Reader for the XML polar files JavaFoil writes with `Polar.Save`.

use std::collections::HashMap;
use std::path::Path;

use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

use crate::error::{SweepError, SweepResult};
use crate::profile_scope;

pub const POLAR_NAMESPACE: &str = "http://www.mh-aerotools.de/polar-schema";

/// One angle of attack of a polar.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolarPoint {
    pub alpha: f64,
    pub cl: f64,
    pub cd: f64,
    pub cm: f64,
}

pub fn parse_polar_file<P: AsRef<Path>>(path: P) -> SweepResult<Vec<PolarPoint>> {
    let text = std::fs::read_to_string(path)?;
    parse_polar_str(&text)
}

/// Data points of the first polar in the document. A document without a
/// polar yields no points; a variable the polar does not list reads as 0.0.
pub fn parse_polar_str(text: &str) -> SweepResult<Vec<PolarPoint>> {
    profile_scope!("polar_parse");
    let doc = Document::parse(text)?;

    let Some(polar) = doc
        .descendants()
        .find(|n| n.has_tag_name((POLAR_NAMESPACE, "polar")))
    else {
        return Ok(Vec::new());
    };

    // First occurrence wins when a variable name repeats
    let mut columns: HashMap<String, usize> = HashMap::new();
    for (idx, v) in descendant_elements(polar, "variables")
        .flat_map(|vars| child_elements(vars, "variable"))
        .enumerate()
    {
        columns
            .entry(v.text().unwrap_or("").trim().to_lowercase())
            .or_insert(idx);
    }

    let mut points = Vec::new();
    for datapoint in
        descendant_elements(polar, "datapoints").flat_map(|dps| child_elements(dps, "datapoint"))
    {
        let values = child_elements(datapoint, "value")
            .map(|v| parse_value(v.text().unwrap_or("")))
            .collect::<SweepResult<Vec<f64>>>()?;

        let get = |name: &str| {
            columns
                .get(name)
                .and_then(|&idx| values.get(idx))
                .copied()
                .unwrap_or(0.0)
        };

        points.push(PolarPoint {
            alpha: get("alpha"),
            cl: get("cl"),
            cd: get("cd"),
            cm: get("cm"),
        });
    }

    Ok(points)
}

fn child_elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |n| n.has_tag_name((POLAR_NAMESPACE, name)))
}

/// Sections may sit below wrapper elements inside the polar.
fn descendant_elements<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants()
        .filter(move |n| n.has_tag_name((POLAR_NAMESPACE, name)))
}

/// Values may use a decimal comma depending on the host locale.
fn parse_value(raw: &str) -> SweepResult<f64> {
    let normalized = raw.trim().replace(',', ".");
    normalized.parse().map_err(|_| SweepError::Number {
        value: raw.trim().to_string(),
        context: "polar datapoint".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<polars xmlns="http://www.mh-aerotools.de/polar-schema">
  <polar>
    <name>NACA2412</name>
    <variables>
      <variable>alpha</variable>
      <variable> Cl </variable>
      <variable>Cd</variable>
      <variable>Cm 0.25</variable>
      <variable>Cm</variable>
    </variables>
    <datapoints>
      <datapoint><value>-1,0</value><value>0,12</value><value>0,0071</value><value>9</value><value>-0,05</value></datapoint>
      <datapoint><value>0.0</value><value>0.23</value><value>0.0068</value><value>9</value><value>-0.052</value></datapoint>
    </datapoints>
  </polar>
</polars>"#;

    #[test]
    fn reads_named_columns_with_decimal_commas() {
        let points = parse_polar_str(SAMPLE).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(
            points[0],
            PolarPoint {
                alpha: -1.0,
                cl: 0.12,
                cd: 0.0071,
                cm: -0.05
            }
        );
        assert_eq!(points[1].cl, 0.23);
        assert_eq!(points[1].cm, -0.052);
    }

    #[test]
    fn missing_column_reads_as_zero() {
        let xml = r#"<polars xmlns="http://www.mh-aerotools.de/polar-schema"><polar>
            <variables><variable>alpha</variable><variable>cl</variable></variables>
            <datapoints><datapoint><value>2</value><value>0.4</value></datapoint></datapoints>
        </polar></polars>"#;
        let points = parse_polar_str(xml).unwrap();
        assert_eq!(
            points,
            vec![PolarPoint {
                alpha: 2.0,
                cl: 0.4,
                cd: 0.0,
                cm: 0.0
            }]
        );
    }

    #[test]
    fn sections_below_wrappers_are_found() {
        let xml = r#"<polars xmlns="http://www.mh-aerotools.de/polar-schema"><polar>
            <header><variables><variable>alpha</variable><variable>Cl</variable></variables></header>
            <body><datapoints>
                <datapoint><value>-1</value><value>-0,1</value></datapoint>
                <datapoint><value>1</value><value>0,1</value></datapoint>
            </datapoints></body>
        </polar></polars>"#;
        let points = parse_polar_str(xml).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].alpha, -1.0);
        assert_eq!(points[1].cl, 0.1);
        assert_eq!(points[1].cd, 0.0);
    }

    #[test]
    fn document_without_polar_is_empty() {
        let xml = r#"<polars xmlns="http://www.mh-aerotools.de/polar-schema"/>"#;
        assert!(parse_polar_str(xml).unwrap().is_empty());
        // Wrong namespace: not a JavaFoil polar
        assert!(parse_polar_str("<polars><polar/></polars>").unwrap().is_empty());
    }

    #[test]
    fn malformed_input_is_an_error() {
        assert!(matches!(
            parse_polar_str("<polars><polar>"),
            Err(SweepError::Xml(_))
        ));
        let bad_number = r#"<polars xmlns="http://www.mh-aerotools.de/polar-schema"><polar>
            <variables><variable>alpha</variable></variables>
            <datapoints><datapoint><value>n/a</value></datapoint></datapoints>
        </polar></polars>"#;
        assert!(matches!(
            parse_polar_str(bad_number),
            Err(SweepError::Number { .. })
        ));
    }
}

//! Line-oriented input: one or more graphs per file, each introduced by a
//! `#Graph <id>` header, followed by the vertex count and one `u v w` row per
//! edge. Graphs come back canonicalised with their width cached.

use crate::antichain;
use crate::error::{Error, Result};
use crate::graph::{Node, StDag};
use log::*;
use std::fs;
use std::path::Path;

pub fn read_graphs(path: impl AsRef<Path>) -> Result<Vec<StDag>> {
    let text = fs::read_to_string(path)?;
    parse(&text)
}

pub fn parse(text: &str) -> Result<Vec<StDag>> {
    let lines: Vec<(usize, &str)> = text
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
        .collect();

    let mut graphs = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let (header_line, header) = lines[i];
        let id = parse_header(header_line, header)?;
        i += 1;

        let (n_line, n_text) = *lines.get(i).ok_or(Error::Parse {
            line: header_line,
            reason: "graph header with no vertex count".into(),
        })?;
        let n: usize = n_text.parse().map_err(|_| Error::Parse {
            line: n_line,
            reason: format!("expected a vertex count, found {:?}", n_text),
        })?;
        i += 1;

        let mut edges = Vec::new();
        while i < lines.len() && !lines[i].1.starts_with('#') {
            let (line, row) = lines[i];
            edges.push(parse_edge(line, row)?);
            i += 1;
        }

        graphs.push(build(n, &edges, id)?);
    }
    Ok(graphs)
}

fn parse_header(line: usize, header: &str) -> Result<&str> {
    let mut parts = header.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("#Graph"), Some(id)) => Ok(id),
        _ => Err(Error::Parse {
            line,
            reason: format!("expected `#Graph <id>`, found {:?}", header),
        }),
    }
}

fn parse_edge(line: usize, row: &str) -> Result<(Node, Node, u64)> {
    let fields: Vec<&str> = row.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(Error::Parse {
            line,
            reason: format!("expected `u v w`, found {:?}", row),
        });
    }
    let number = |field: &str| -> Result<u64> {
        field.parse().map_err(|_| Error::Parse {
            line,
            reason: format!("expected a non-negative integer, found {:?}", field),
        })
    };
    Ok((
        number(fields[0])? as Node,
        number(fields[1])? as Node,
        number(fields[2])?,
    ))
}

fn build(n: usize, edges: &[(Node, Node, u64)], id: &str) -> Result<StDag> {
    if n == 0 {
        warn!("graph {} has 0 vertices", id);
        return Ok(StDag::new(2, 0, 1, id));
    }
    let mut g = StDag::canonical(n, edges, id)?;
    let width = antichain::width(&g)?;
    g.cache_width(width);
    Ok(g)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_single_graph() {
        let graphs = parse("#Graph g1\n3\n0 1 4\n1 2 4\n").unwrap();
        assert_eq!(graphs.len(), 1);
        let g = &graphs[0];
        assert_eq!(g.id(), "g1");
        assert_eq!(g.num_nodes(), 5);
        assert_eq!(g.width(), 1);
        assert_eq!(g.flow(1, 2), 4);
    }

    #[test]
    fn parses_multiple_graphs() {
        let graphs = parse("#Graph a\n2\n0 1 1\n#Graph b\n3\n0 1 2\n0 2 1\n").unwrap();
        assert_eq!(graphs.len(), 2);
        assert_eq!(graphs[0].id(), "a");
        assert_eq!(graphs[1].id(), "b");
        assert_eq!(graphs[1].width(), 2);
    }

    #[test]
    fn trims_and_skips_blank_lines() {
        let graphs = parse("  #Graph a  \n\n2\n 0 1 1 \n\n").unwrap();
        assert_eq!(graphs.len(), 1);
        assert_eq!(graphs[0].num_edges(), 3);
    }

    #[test]
    fn rejects_malformed_edge_row_with_line() {
        let err = parse("#Graph a\n2\n0 1\n").unwrap_err();
        match err {
            Error::Parse { line, .. } => assert_eq!(line, 3),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn rejects_negative_weight() {
        let err = parse("#Graph a\n2\n0 1 -3\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }

    #[test]
    fn rejects_missing_header() {
        let err = parse("2\n0 1 1\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn zero_vertex_graph_parses_with_warning() {
        let graphs = parse("#Graph empty\n0\n").unwrap();
        assert_eq!(graphs[0].num_nodes(), 2);
        assert_eq!(graphs[0].num_edges(), 0);
        assert_eq!(graphs[0].width(), 0);
        assert!(graphs[0].is_zero_flow_everywhere());
    }

    #[test]
    fn out_of_range_vertex_is_invalid() {
        let err = parse("#Graph a\n2\n0 5 1\n").unwrap_err();
        assert!(matches!(err, Error::InvalidGraph { .. }));
    }
}

//! Radio topology rendering.

use std::io::{self, Write};

use wpan_nlink::netlink::genl::hwsim::Radio;

/// One block per radio listing its outgoing edges.
pub fn write_text<W: Write>(w: &mut W, radios: &[Radio]) -> io::Result<()> {
    for radio in radios {
        writeln!(w, "wpan_hwsim radio{}:", radio.id)?;
        for edge in &radio.edges {
            writeln!(w, "\tedge:")?;
            writeln!(w, "\t\tradio{}", edge.endpoint)?;
            writeln!(w, "\t\tlqi: 0x{:02x}", edge.lqi)?;
        }
    }
    Ok(())
}

/// Graphviz digraph with one labelled arc per edge.
pub fn write_dot<W: Write>(w: &mut W, radios: &[Radio]) -> io::Result<()> {
    writeln!(w, "digraph {{")?;
    for radio in radios {
        for edge in &radio.edges {
            writeln!(w, "\t{} -> {}[label={}];", radio.id, edge.endpoint, edge.lqi)?;
        }
    }
    writeln!(w, "}}")
}

/// Drop radio `ignore` and every edge pointing at it.
pub fn filter(radios: &[Radio], ignore: Option<u32>) -> Vec<Radio> {
    match ignore {
        Some(idx) => radios.iter().filter_map(|r| r.without(idx)).collect(),
        None => radios.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wpan_nlink::netlink::genl::hwsim::Edge;

    fn mesh() -> Vec<Radio> {
        vec![
            Radio {
                id: 0,
                edges: vec![Edge { endpoint: 1, lqi: 0xff }, Edge { endpoint: 2, lqi: 0x10 }],
            },
            Radio {
                id: 1,
                edges: vec![Edge { endpoint: 0, lqi: 0xff }],
            },
            Radio { id: 2, edges: vec![] },
        ]
    }

    fn render(f: fn(&mut Vec<u8>, &[Radio]) -> io::Result<()>, radios: &[Radio]) -> String {
        let mut out = Vec::new();
        f(&mut out, radios).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_text() {
        let out = render(write_text, &mesh());
        assert_eq!(
            out,
            "wpan_hwsim radio0:\n\
             \tedge:\n\t\tradio1\n\t\tlqi: 0xff\n\
             \tedge:\n\t\tradio2\n\t\tlqi: 0x10\n\
             wpan_hwsim radio1:\n\
             \tedge:\n\t\tradio0\n\t\tlqi: 0xff\n\
             wpan_hwsim radio2:\n"
        );
    }

    #[test]
    fn test_dot() {
        let out = render(write_dot, &mesh());
        assert_eq!(
            out,
            "digraph {\n\t0 -> 1[label=255];\n\t0 -> 2[label=16];\n\t1 -> 0[label=255];\n}\n"
        );
    }

    #[test]
    fn test_dot_empty() {
        assert_eq!(render(write_dot, &[]), "digraph {\n}\n");
    }

    #[test]
    fn test_ignore_monitor_radio() {
        let radios = filter(&mesh(), Some(2));
        assert_eq!(radios.len(), 2);
        assert_eq!(
            render(write_dot, &radios),
            "digraph {\n\t0 -> 1[label=255];\n\t1 -> 0[label=255];\n}\n"
        );
        assert_eq!(filter(&mesh(), None), mesh());
    }
}

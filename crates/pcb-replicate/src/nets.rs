//! Net correspondence between a source sheet and a destination sheet.
//!
//! Nets are paired through matched footprints: pad `n` of a source footprint
//! and pad `n` of its destination counterpart carry corresponding nets.
//! Repeated pad names (thermal pad arrays, mounting holes) pair in order of
//! appearance.
//! Each pairing is then sanity-checked by name:
//!
//! 1. Identical names pair.
//! 2. Nets local to their sheet pair regardless of name, since local nets
//!    are named per instance.
//! 3. Otherwise the hierarchical segments of both names are compared. Pairs
//!    scoring above [`SIMILARITY_THRESHOLD`] are trusted; the rest are still
//!    paired but reported as [`ConnectivityIssue`]s.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use log::{debug, warn};
use similar::TextDiff;

use crate::board::Component;
use crate::catalog::Catalog;
use crate::error::ConnectivityIssue;
use crate::matcher::ComponentPair;

/// Average segment similarity above which a renamed net is trusted.
pub const SIMILARITY_THRESHOLD: f64 = 0.8;

/// Nets connected to the footprints of one sheet instance.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetNets {
    /// Every net a pad on the sheet connects to
    pub all: BTreeSet<String>,
    /// Nets no footprint outside the sheet connects to
    pub local: BTreeSet<String>,
}

impl SheetNets {
    pub fn for_sheet(catalog: &Catalog, prefix: &[String]) -> Self {
        let on = catalog.on_sheet(prefix);
        let off = catalog.not_on_sheet(prefix);
        let all = pad_nets(on.iter().map(|c| &c.component));
        let outside = pad_nets(off.iter().map(|c| &c.component));
        let local = all
            .iter()
            .filter(|net| !net.is_empty() && !outside.contains(*net))
            .cloned()
            .collect();
        Self { all, local }
    }

    pub fn contains(&self, net: &str) -> bool {
        self.all.contains(net)
    }

    pub fn is_local(&self, net: &str) -> bool {
        self.local.contains(net)
    }
}

/// All nets connected to the pads of `components`.
pub fn pad_nets<'a, I>(components: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a Component>,
{
    components
        .into_iter()
        .flat_map(|c| c.pads.iter().map(|p| p.net.clone()))
        .collect()
}

/// Similarity of two hierarchical net names in `[0, 1]`.
///
/// The segments of the shorter name are each scored against their best
/// match among the segments of the longer one, and the scores averaged.
pub fn net_name_similarity(a: &str, b: &str) -> f64 {
    let split = |name: &str| -> Vec<String> {
        name.split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };
    let (a, b) = (split(a), split(b));
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if shorter.is_empty() {
        return if longer.is_empty() { 1.0 } else { 0.0 };
    }
    let total: f64 = shorter
        .iter()
        .map(|s| {
            longer
                .iter()
                .map(|l| f64::from(TextDiff::from_chars(s.as_str(), l.as_str()).ratio()))
                .fold(0.0, f64::max)
        })
        .sum();
    total / shorter.len() as f64
}

/// Source net to destination net mapping for one destination sheet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NetMap {
    pairs: BTreeSet<(String, String)>,
}

impl NetMap {
    pub fn from_pairs<I: IntoIterator<Item = (String, String)>>(pairs: I) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    /// Destination net for `source`. The first pair wins when a source net
    /// maps to several destination nets.
    pub fn destination(&self, source: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(s, _)| s == source)
            .map(|(_, d)| d.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Derive the net mapping from matched footprints.
///
/// Uncertain pairings are added to `issues` under the destination
/// footprint reference.
pub fn pair_nets(
    pairs: &[ComponentPair<'_>],
    src_nets: &SheetNets,
    dst_nets: &SheetNets,
    issues: &mut BTreeSet<ConnectivityIssue>,
) -> NetMap {
    let mut map = BTreeSet::new();
    for pair in pairs {
        let (src, dst) = (&pair.source.component, &pair.destination.component);
        let mut dst_pads: HashMap<&str, Vec<&str>> = HashMap::new();
        for p in &dst.pads {
            dst_pads.entry(p.name.as_str()).or_default().push(p.net.as_str());
        }
        let mut occurrence: HashMap<&str, usize> = HashMap::new();

        for pad in &src.pads {
            let nth = occurrence.entry(pad.name.as_str()).or_default();
            let dst_net = dst_pads
                .get(pad.name.as_str())
                .and_then(|nets| nets.get(*nth).or(nets.last()))
                .copied();
            *nth += 1;
            let Some(dst_net) = dst_net else {
                debug!(
                    "Pad {} of {} has no counterpart on {}",
                    pad.name, src.reference, dst.reference
                );
                continue;
            };
            let src_net = pad.net.as_str();
            if src_net != dst_net
                && !(src_nets.is_local(src_net) && dst_nets.is_local(dst_net))
            {
                let score = net_name_similarity(src_net, dst_net);
                if score <= SIMILARITY_THRESHOLD {
                    debug!(
                        "Uncertain net pairing {src_net} -> {dst_net} on {} pad {} ({score:.2})",
                        dst.reference, pad.name
                    );
                    issues.insert(ConnectivityIssue {
                        reference: dst.reference.clone(),
                        pad: pad.name.clone(),
                    });
                }
            }
            map.insert((src_net.to_string(), dst_net.to_string()));
        }
    }

    let mut targets: BTreeMap<&str, usize> = BTreeMap::new();
    for (src, _) in &map {
        *targets.entry(src.as_str()).or_default() += 1;
    }
    for (net, count) in targets.into_iter().filter(|(_, n)| *n > 1) {
        warn!("Net {net} maps to {count} different nets on the destination sheet");
    }

    NetMap { pairs: map }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{ItemId, Pad};
    use crate::catalog::CatalogComponent;
    use crate::geometry::{BoundingBox, Point};
    use crate::hierarchy::SheetPath;

    fn part(reference: &str, pads: &[(&str, &str)]) -> CatalogComponent {
        CatalogComponent {
            id: ItemId::new(),
            component: Component {
                reference: reference.into(),
                value: String::new(),
                path: String::new(),
                properties: Default::default(),
                position: Point::default(),
                orientation: 0.0,
                layer: "F.Cu".into(),
                locked: false,
                group: None,
                body: BoundingBox::default(),
                pads: pads
                    .iter()
                    .map(|(name, net)| Pad {
                        name: name.to_string(),
                        net: net.to_string(),
                    })
                    .collect(),
                texts: vec![],
                settings: Default::default(),
            },
            symbol_id: Some("x".into()),
            sheet: SheetPath::default(),
        }
    }

    fn nets(all: &[&str], local: &[&str]) -> SheetNets {
        SheetNets {
            all: all.iter().map(|s| s.to_string()).collect(),
            local: local.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_similarity() {
        assert_eq!(net_name_similarity("/GND", "/GND"), 1.0);
        assert!(net_name_similarity("/Channel A/OUT", "/Channel B/OUT") > SIMILARITY_THRESHOLD);
        assert!(net_name_similarity("/A/VCC", "/B/GND") <= SIMILARITY_THRESHOLD);
        // Shorter name is matched against the longer one, both ways round.
        assert_eq!(
            net_name_similarity("/top/ch1/SDA", "/SDA"),
            net_name_similarity("/SDA", "/top/ch1/SDA")
        );
        assert_eq!(net_name_similarity("", ""), 1.0);
    }

    #[test]
    fn test_identical_and_local_nets_pair_silently() {
        let src = part("U1", &[("1", "GND"), ("2", "Net-(U1-Pad2)")]);
        let dst = part("U2", &[("1", "GND"), ("2", "Net-(U2-Pad2)")]);
        let pairs = [ComponentPair {
            source: &src,
            destination: &dst,
        }];
        let mut issues = BTreeSet::new();
        let map = pair_nets(
            &pairs,
            &nets(&["GND", "Net-(U1-Pad2)"], &["Net-(U1-Pad2)"]),
            &nets(&["GND", "Net-(U2-Pad2)"], &["Net-(U2-Pad2)"]),
            &mut issues,
        );
        assert!(issues.is_empty());
        assert_eq!(map.destination("GND"), Some("GND"));
        assert_eq!(map.destination("Net-(U1-Pad2)"), Some("Net-(U2-Pad2)"));
        assert_eq!(map.destination("missing"), None);
    }

    #[test]
    fn test_low_similarity_reported_once() {
        let src1 = part("U1", &[("1", "/a/VCC"), ("2", "/a/VCC")]);
        let dst1 = part("U2", &[("1", "/b/GND"), ("2", "/b/GND")]);
        let src2 = part("C1", &[("1", "/a/VCC")]);
        let dst2 = part("C2", &[("1", "/b/GND")]);
        let pairs = [
            ComponentPair {
                source: &src1,
                destination: &dst1,
            },
            ComponentPair {
                source: &src2,
                destination: &dst2,
            },
            ComponentPair {
                source: &src2,
                destination: &dst2,
            },
        ];
        let mut issues = BTreeSet::new();
        let map = pair_nets(
            &pairs,
            &SheetNets::default(),
            &SheetNets::default(),
            &mut issues,
        );
        assert_eq!(map.len(), 1);
        assert_eq!(map.destination("/a/VCC"), Some("/b/GND"));
        let flagged: Vec<String> = issues.iter().map(ToString::to_string).collect();
        assert_eq!(flagged, ["C2 pad 1", "U2 pad 1", "U2 pad 2"]);
    }

    #[test]
    fn test_repeated_pad_names_pair_in_order() {
        let src = part("U1", &[("1", "/ch1/IN"), ("EP", "GND"), ("EP", "/ch1/SHIELD")]);
        let dst = part("U2", &[("EP", "GND"), ("EP", "/ch2/SHIELD"), ("1", "/ch2/IN")]);
        let pairs = [ComponentPair {
            source: &src,
            destination: &dst,
        }];
        let mut issues = BTreeSet::new();
        let map = pair_nets(
            &pairs,
            &SheetNets::default(),
            &SheetNets::default(),
            &mut issues,
        );
        assert_eq!(map.len(), 3);
        assert_eq!(map.destination("GND"), Some("GND"));
        assert_eq!(map.destination("/ch1/SHIELD"), Some("/ch2/SHIELD"));
        assert_eq!(map.destination("/ch1/IN"), Some("/ch2/IN"));
        assert!(issues.is_empty());
    }

    #[test]
    fn test_local_requires_both_sides() {
        let src = part("U1", &[("1", "Net-(U1-Pad1)")]);
        let dst = part("U2", &[("1", "/shared/CLK")]);
        let pairs = [ComponentPair {
            source: &src,
            destination: &dst,
        }];
        let mut issues = BTreeSet::new();
        pair_nets(
            &pairs,
            &nets(&["Net-(U1-Pad1)"], &["Net-(U1-Pad1)"]),
            &nets(&["/shared/CLK"], &[]),
            &mut issues,
        );
        assert_eq!(issues.len(), 1);
    }
}

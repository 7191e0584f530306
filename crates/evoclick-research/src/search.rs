//! Node lookup by text and by stage.

use evoclick_core::defs::{Catalog, ResearchNodeDef, Stage};

/// Nodes of one stage, in definition order.
pub fn nodes_in_stage(catalog: &Catalog, stage: Stage) -> Vec<&ResearchNodeDef> {
    catalog.nodes().filter(|n| n.stage == stage).collect()
}

/// Case-insensitive substring match on name or description, in either
/// language.
///
/// Results are grouped by stage (Cosmos, Life, Intellect) and keep
/// definition order within a stage. A blank query matches nothing.
pub fn search<'c>(catalog: &'c Catalog, query: &str) -> Vec<&'c ResearchNodeDef> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return Vec::new();
    }
    Stage::ALL
        .iter()
        .flat_map(|&stage| nodes_in_stage(catalog, stage))
        .filter(|n| {
            [&n.name, &n.description, &n.name_en, &n.description_en]
                .iter()
                .any(|text| text.to_lowercase().contains(&needle))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use evoclick_core::defs::ResearchNodeDef;
    use evoclick_core::test_utils::*;

    fn ids(nodes: &[&ResearchNodeDef]) -> Vec<String> {
        nodes.iter().map(|n| n.id.to_string()).collect()
    }

    fn catalog() -> Catalog {
        let stars = ResearchNodeDef {
            name: "Звёзды".into(),
            name_en: "Stars".into(),
            description: "Fusion ignites".into(),
            ..node("stars", 10.0, 1.2, 5)
        };
        let cell = ResearchNodeDef {
            name: "First Cell".into(),
            description: "Membranes and stars of life".into(),
            stage: Stage::Life,
            ..node("cell", 10.0, 1.2, 5)
        };
        let fire = ResearchNodeDef {
            name: "Fire".into(),
            description: "Warmth".into(),
            stage: Stage::Intellect,
            ..node("fire", 10.0, 1.2, 5)
        };
        // Defined out of stage order on purpose.
        Catalog::new(vec![fire, cell, stars], Vec::new()).unwrap()
    }

    #[test]
    fn matches_name_or_description_case_insensitively() {
        let catalog = catalog();
        assert_eq!(ids(&search(&catalog, "STAR")), vec!["stars", "cell"]);
        assert_eq!(ids(&search(&catalog, "warm")), vec!["fire"]);
        assert_eq!(ids(&search(&catalog, "ЗВЁЗД")), vec!["stars"]);
    }

    #[test]
    fn results_grouped_by_stage() {
        let catalog = catalog();
        assert_eq!(ids(&search(&catalog, "i")), vec!["stars", "cell", "fire"]);
    }

    #[test]
    fn blank_query_matches_nothing() {
        let catalog = catalog();
        assert!(search(&catalog, "").is_empty());
        assert!(search(&catalog, "   ").is_empty());
    }

    #[test]
    fn stage_filter() {
        let catalog = catalog();
        assert_eq!(ids(&nodes_in_stage(&catalog, Stage::Life)), vec!["cell"]);
        assert_eq!(nodes_in_stage(&catalog, Stage::Cosmos).len(), 1);
    }
}

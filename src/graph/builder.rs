//! Heterogeneous graph construction from a catalogue snapshot.

use crate::catalog::{Catalog, Entity, Game};

use super::{AttrValue, Attributes, EdgeType, Graph, GraphResult, NodeType};

/// Builds the heterogeneous graph: one node per game and per distinct
/// attribute entity, one edge from each game to each of its attributes.
pub struct GraphBuilder;

impl GraphBuilder {
    /// Build a fresh heterogeneous graph from `catalog`.
    ///
    /// Nodes are inserted games first, then mechanics, categories, designers
    /// and families (standalone lists before entities first seen on a game).
    /// Any construction error aborts the build.
    pub fn build(catalog: &Catalog) -> GraphResult<Graph> {
        let mut graph = Graph::with_capacity(catalog.games.len() * 4, catalog.games.len() * 8);

        for game in &catalog.games {
            graph.add_node(
                NodeType::Game.node_id(game.id),
                NodeType::Game,
                game.name.as_str(),
                game_attributes(game),
            )?;
        }

        for edge_type in EdgeType::ALL {
            let node_type = edge_type.target_type();
            let standalone = standalone_entities(catalog, edge_type);
            let referenced = catalog
                .games
                .iter()
                .flat_map(|g| associated(g, edge_type).iter());
            for entity in standalone.iter().chain(referenced) {
                let id = node_type.node_id(entity.id);
                if graph.contains(&id) {
                    continue;
                }
                graph.add_node(id, node_type, entity.name.as_str(), entity_attributes(entity))?;
            }
        }

        for game in &catalog.games {
            let game_id = NodeType::Game.node_id(game.id);
            for edge_type in EdgeType::ALL {
                let node_type = edge_type.target_type();
                for entity in associated(game, edge_type) {
                    graph.add_edge(
                        &game_id,
                        &node_type.node_id(entity.id),
                        edge_type,
                        Attributes::new(),
                    )?;
                }
            }
        }

        tracing::info!(
            games = catalog.games.len(),
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "built heterogeneous graph"
        );
        Ok(graph)
    }
}

fn associated(game: &Game, edge_type: EdgeType) -> &[Entity] {
    match edge_type {
        EdgeType::HasMechanic => &game.mechanics,
        EdgeType::HasCategory => &game.categories,
        EdgeType::HasDesigner => &game.designers,
        EdgeType::HasFamily => &game.families,
    }
}

fn standalone_entities(catalog: &Catalog, edge_type: EdgeType) -> &[Entity] {
    match edge_type {
        EdgeType::HasMechanic => &catalog.mechanics,
        EdgeType::HasCategory => &catalog.categories,
        EdgeType::HasDesigner => &catalog.designers,
        EdgeType::HasFamily => &catalog.families,
    }
}

fn game_attributes(game: &Game) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("bgg_id".into(), AttrValue::from(game.bgg_id));
    attrs.insert("bgg_rank".into(), AttrValue::from(game.bgg_rank));
    attrs.insert("year_published".into(), AttrValue::from(game.year_published));
    attrs.insert(
        "bgg_average_rating".into(),
        AttrValue::from(game.bgg_average_rating),
    );
    attrs.insert("bgg_geek_rating".into(), AttrValue::from(game.bgg_geek_rating));
    attrs.insert("image_url".into(), AttrValue::from(game.image_url.clone()));
    attrs.insert(
        "thumbnail_url".into(),
        AttrValue::from(game.thumbnail_url.clone()),
    );
    attrs.insert("min_players".into(), AttrValue::from(game.min_players));
    attrs.insert("max_players".into(), AttrValue::from(game.max_players));
    attrs.insert("playing_time".into(), AttrValue::from(game.playing_time));
    attrs
}

fn entity_attributes(entity: &Entity) -> Attributes {
    let mut attrs = Attributes::new();
    attrs.insert("bgg_id".into(), AttrValue::from(entity.bgg_id));
    attrs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::NeighborDirection;

    fn mech(id: u64, name: &str) -> Entity {
        Entity::new(id, 1000 + id, name)
    }

    fn small_catalog() -> Catalog {
        let trading = mech(1, "Trading");
        let dice = mech(2, "Dice Rolling");
        let teuber = Entity::new(5, 11, "Klaus Teuber");
        let mut catan = Game::new(1, "Catan")
            .with_mechanic(trading.clone())
            .with_mechanic(dice.clone())
            .with_designer(teuber.clone())
            .with_family(Entity::new(9, 3, "Catan"));
        catan.year_published = Some(1995);
        catan.bgg_average_rating = Some(7.1);
        let cities = Game::new(2, "Cities & Knights")
            .with_mechanic(dice)
            .with_designer(teuber)
            .with_category(Entity::new(3, 1021, "Economic"));
        Catalog::from_games(vec![catan, cities])
    }

    #[test]
    fn one_node_per_distinct_entity() {
        let g = GraphBuilder::build(&small_catalog()).unwrap();
        let stats = g.statistics();
        assert_eq!(stats.nodes_by_type["game"], 2);
        assert_eq!(stats.nodes_by_type["mechanic"], 2);
        assert_eq!(stats.nodes_by_type["designer"], 1);
        assert_eq!(stats.nodes_by_type["category"], 1);
        assert_eq!(stats.nodes_by_type["family"], 1);
        assert_eq!(stats.total_nodes, 7);
    }

    #[test]
    fn edges_only_run_from_games_to_attributes() {
        let g = GraphBuilder::build(&small_catalog()).unwrap();
        assert_eq!(g.edge_count(), 7);
        for edge in g.edges() {
            let source = g.node(edge.source).unwrap();
            let target = g.node(edge.target).unwrap();
            assert_eq!(source.node_type, NodeType::Game);
            assert_eq!(target.node_type, edge.edge_type.target_type());
        }
        let n = g.neighbors("mechanic-2", NeighborDirection::Incoming).unwrap();
        assert_eq!(n.incoming.len(), 2);
    }

    #[test]
    fn game_attributes_are_carried() {
        let g = GraphBuilder::build(&small_catalog()).unwrap();
        let catan = g.node("game-1").unwrap();
        assert_eq!(catan.label, "Catan");
        assert_eq!(catan.attr("year_published"), Some(&AttrValue::Int(1995)));
        assert_eq!(catan.attr("bgg_average_rating"), Some(&AttrValue::Float(7.1)));
        assert_eq!(catan.attr("image_url"), Some(&AttrValue::Null));
        assert_eq!(
            g.node("mechanic-1").unwrap().attr("bgg_id"),
            Some(&AttrValue::Int(1001))
        );
    }

    #[test]
    fn game_and_mechanic_share_key_without_collision() {
        let g = GraphBuilder::build(&small_catalog()).unwrap();
        assert!(g.contains("game-1"));
        assert!(g.contains("mechanic-1"));
        assert_ne!(
            g.node("game-1").unwrap().node_type,
            g.node("mechanic-1").unwrap().node_type
        );
    }

    #[test]
    fn standalone_entities_become_nodes() {
        let mut catalog = small_catalog();
        catalog.mechanics.push(mech(42, "Unused"));
        catalog.mechanics.push(mech(1, "Trading"));
        let g = GraphBuilder::build(&catalog).unwrap();
        assert!(g.contains("mechanic-42"));
        assert_eq!(g.degree("mechanic-42").unwrap(), 0);
        assert_eq!(g.nodes_by_type(NodeType::Mechanic).len(), 3);
    }

    #[test]
    fn empty_catalog_yields_empty_graph() {
        let g = GraphBuilder::build(&Catalog::default()).unwrap();
        assert_eq!(g.node_count(), 0);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn duplicate_game_aborts_build() {
        let catalog = Catalog::from_games(vec![Game::new(1, "Catan"), Game::new(1, "Catan")]);
        assert!(GraphBuilder::build(&catalog).is_err());
    }

    #[test]
    fn building_twice_is_identical() {
        let catalog = small_catalog();
        let a = GraphBuilder::build(&catalog).unwrap();
        let b = GraphBuilder::build(&catalog).unwrap();
        assert_eq!(a.to_document(), b.to_document());
    }
}

//! Tests for longer mutation sequences
//!
//! This tests:
//! - Move + rename + delete chains
//! - Undo/redo sequences and redo invalidation
//! - Batched operations
//! - Mutation records replayed from JSON
//! - Page operations going through history
//! - Page ids staying unique in blank and reloaded projects

use pageforge_editor::{
    check_project, ComponentNode, Direction, DropPosition, Editor, EditorConfig, EditorError, HistoryConfig,
    IdAllocator, IdGenerator, MemoryStorage, Mutation, MutationContext, MutationError, Page, Project,
};
use std::collections::HashSet;

fn leaf(id: &str) -> ComponentNode {
    ComponentNode::new(id, "Div")
}

fn shape(nodes: &[ComponentNode]) -> String {
    nodes
        .iter()
        .map(|n| {
            if n.children.is_empty() {
                n.id.clone()
            } else {
                format!("{}[{}]", n.id, shape(&n.children))
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// root[header, body[a, b, c], footer]
fn page_editor() -> Editor {
    let tree = vec![leaf("root")
        .with_child(leaf("header"))
        .with_child(leaf("body").with_child(leaf("a")).with_child(leaf("b")).with_child(leaf("c")))
        .with_child(leaf("footer"))];
    let page = Page::new("home", "Home").with_tree(tree);
    Editor::new(Project::new("site", "Site", page), EditorConfig::default())
}

#[test]
fn test_move_rename_delete_chain() {
    let mut editor = page_editor();

    assert!(editor.move_node("c", Direction::Up));
    assert!(editor.rename("c", Some("Third")));
    assert!(editor.reorder("c", "footer", DropPosition::Inside));
    assert!(editor.remove("a"));
    assert_eq!(shape(editor.get_tree()), "root[header,body[b],footer[c]]");
    assert_eq!(editor.get_node_by_id("c").unwrap().name.as_deref(), Some("Third"));

    assert!(editor.undo());
    assert_eq!(shape(editor.get_tree()), "root[header,body[a,b],footer[c]]");
    assert!(editor.undo());
    assert_eq!(shape(editor.get_tree()), "root[header,body[a,c,b],footer]");
    assert!(editor.undo());
    assert!(editor.get_node_by_id("c").unwrap().name.is_none());
    assert!(editor.undo());
    assert_eq!(shape(editor.get_tree()), "root[header,body[a,b,c],footer]");
    assert!(!editor.undo());

    for _ in 0..4 {
        assert!(editor.redo());
    }
    assert_eq!(shape(editor.get_tree()), "root[header,body[b],footer[c]]");
    assert!(!editor.redo());
}

#[test]
fn test_new_mutation_clears_redo() {
    let mut editor = page_editor();
    editor.remove("a");
    editor.undo();
    assert!(editor.can_redo());

    editor.remove("b");
    assert!(!editor.can_redo());
    assert_eq!(shape(editor.get_tree()), "root[header,body[a,c],footer]");
}

#[test]
fn test_undo_and_redo_descriptions() {
    let mut editor = page_editor();
    editor.duplicate("header");
    editor.move_node("footer", Direction::Up);

    assert_eq!(editor.history().undo_description(), Some("move"));
    editor.undo();
    assert_eq!(editor.history().undo_description(), Some("duplicate"));
    assert_eq!(editor.history().redo_description(), Some("move"));
}

#[test]
fn test_batch_is_one_undo_step() {
    let mut editor = page_editor();

    let group = editor.batch("wrap and rename", |editor| {
        let id = editor.group(&["b".to_string(), "a".to_string()])?;
        editor.rename(&id, Some("Pair"));
        editor.set_collapsed(&id, true);
        Some(id)
    });
    let group = group.unwrap();

    // children keep sibling order, not argument order
    assert_eq!(shape(editor.get_tree()), format!("root[header,body[{}[a,b],c],footer]", group));
    assert_eq!(editor.history().undo_levels(), 1);
    assert_eq!(editor.history().undo_description(), Some("wrap and rename"));

    editor.undo();
    assert_eq!(shape(editor.get_tree()), "root[header,body[a,b,c],footer]");
}

#[test]
fn test_nested_batches_collapse() {
    let mut editor = page_editor();
    editor.batch("outer", |editor| {
        editor.remove("a");
        editor.batch("inner", |editor| {
            editor.remove("b");
        });
        editor.remove("c");
    });
    assert_eq!(editor.history().undo_levels(), 1);
    editor.undo();
    assert_eq!(shape(editor.get_tree()), "root[header,body[a,b,c],footer]");
}

#[test]
fn test_rejected_ops_inside_batch_record_nothing() {
    let mut editor = page_editor();
    editor.batch("nothing", |editor| {
        editor.remove("ghost");
        editor.move_node("header", Direction::Up);
    });
    assert!(!editor.can_undo());
}

#[test]
fn test_history_limit_drops_oldest() {
    let config = EditorConfig {
        history: HistoryConfig {
            max_levels: 3,
            coalesce_window_ms: 500,
        },
        ..EditorConfig::default()
    };
    let page = Page::new("home", "Home").with_tree(vec![leaf("a"), leaf("b"), leaf("c"), leaf("d"), leaf("e")]);
    let mut editor = Editor::new(Project::new("site", "Site", page), config);

    for id in ["a", "b", "c", "d", "e"] {
        editor.remove(id);
    }
    assert_eq!(editor.history().undo_levels(), 3);
    while editor.undo() {}
    assert_eq!(shape(editor.get_tree()), "c,d,e");
}

#[test]
fn test_group_rejections() {
    let mut editor = page_editor();
    assert!(editor.group(&["a".to_string()]).is_none());
    assert!(editor.group(&["a".to_string(), "a".to_string()]).is_none());
    assert!(editor.group(&["a".to_string(), "header".to_string()]).is_none());
    assert!(editor.group(&["root".to_string(), "a".to_string()]).is_none());
    assert!(editor.group(&["a".to_string(), "ghost".to_string()]).is_none());
    assert!(!editor.can_undo());
}

#[test]
fn test_root_group_rejected_with_custom_root_id() {
    let config = EditorConfig {
        root_id: "canvas".to_string(),
        ..EditorConfig::default()
    };
    let page = Page::new("home", "Home").with_tree(vec![leaf("canvas"), leaf("aside")]);
    let mut editor = Editor::new(Project::new("site", "Site", page), config);

    assert!(editor.group(&["canvas".to_string(), "aside".to_string()]).is_none());
    assert_eq!(editor.selection().anchor(), "canvas");
}

#[test]
fn test_replay_json_mutations_on_raw_tree() {
    let mutations: Vec<Mutation> = serde_json::from_str(
        r#"[
            { "kind": "insert", "node": { "id": "hero", "type": "Section" }, "parentId": "root", "index": 0 },
            { "kind": "updateProps", "nodeIds": ["hero"], "props": { "padding": 24 } },
            { "kind": "reorder", "activeId": "footer", "overId": "hero", "position": "before" },
            { "kind": "move", "nodeId": "hero", "direction": "down" },
            { "kind": "remove", "nodeId": "header" }
        ]"#,
    )
    .unwrap();

    let mut tree = vec![leaf("root").with_child(leaf("header")).with_child(leaf("footer"))];
    let mut generator = IdGenerator::from_seed("replay");
    let mut ctx = MutationContext {
        ids: IdAllocator::new(&mut generator, ["root", "header", "footer"].map(String::from).into()),
        root_id: "root",
    };

    for mutation in &mutations {
        mutation.apply(&mut tree, &mut ctx).unwrap();
    }
    assert_eq!(shape(&tree), "root[footer,hero]");
    assert_eq!(tree[0].children[1].props["padding"], 24);
    assert_eq!(tree[0].children[1].node_type, "Section");
}

#[test]
fn test_raw_mutations_report_reasons() {
    let mut tree = vec![leaf("a").with_child(leaf("b"))];
    let mut generator = IdGenerator::from_seed("raw");
    let mut ctx = MutationContext {
        ids: IdAllocator::new(&mut generator, Default::default()),
        root_id: "root",
    };

    let cycle = Mutation::Reorder {
        active_id: "a".to_string(),
        over_id: "b".to_string(),
        position: DropPosition::Inside,
    };
    assert_eq!(cycle.apply(&mut tree, &mut ctx), Err(MutationError::CycleDetected));

    let missing = Mutation::Remove {
        node_id: "zzz".to_string(),
    };
    assert!(matches!(missing.apply(&mut tree, &mut ctx), Err(MutationError::NodeNotFound(_))));
    assert_eq!(shape(&tree), "a[b]");
}

#[test]
fn test_page_operations_are_undoable() {
    let mut editor = page_editor();

    let about = editor.add_page("About").unwrap();
    let copy = editor.duplicate_page("home").unwrap();
    editor.rename_page(&about, "About us").unwrap();
    editor.reorder_page(&about, 0).unwrap();

    let names: Vec<&str> = editor.project().pages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["About us", "Home", "Home copy"]);
    assert_eq!(editor.project().page(&copy).unwrap().tree.len(), 1);

    editor.undo();
    editor.undo();
    let names: Vec<&str> = editor.project().pages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Home", "Home copy", "About"]);

    editor.undo();
    editor.undo();
    assert_eq!(editor.project().pages.len(), 1);
}

#[test]
fn test_last_page_cannot_be_deleted() {
    let mut editor = page_editor();
    assert!(matches!(editor.delete_page("home"), Err(EditorError::LastPage)));
    assert!(matches!(editor.delete_page("nope"), Err(EditorError::PageNotFound(_))));
    assert!(!editor.can_undo());
}

#[test]
fn test_page_switch_clears_selection_and_drag() {
    let mut editor = page_editor();
    let about = editor.add_page("About").unwrap();

    editor.select("header");
    editor.begin_drag("a");
    editor.set_current_page(&about).unwrap();

    assert!(editor.selected_ids().is_empty());
    assert!(editor.drag_session().is_none());
    assert!(editor.get_tree().is_empty());

    // paste works across pages
    editor.set_current_page("home").unwrap();
    editor.copy("body");
    editor.set_current_page(&about).unwrap();
    let pasted = editor.paste(None).unwrap();
    assert_eq!(editor.get_node_by_id(&pasted).unwrap().count(), 4);
}

fn page_ids(editor: &Editor) -> Vec<String> {
    editor.project().pages.iter().map(|p| p.id.clone()).collect()
}

#[test]
fn test_blank_project_mints_distinct_page_and_node_ids() {
    let mut editor = Editor::blank("site", "Site", EditorConfig::default());
    let first = editor.current_page_id().unwrap().to_string();

    let added = editor.add_page("Other").unwrap();
    let copy = editor.duplicate_page(&first).unwrap();
    let node = editor.create_node("Div");

    assert_ne!(first, added);
    assert_ne!(copy, first);
    assert_ne!(copy, added);
    for page_id in [&first, &added, &copy] {
        assert_ne!(&node.id, page_id);
    }
    assert!(check_project(editor.project()).is_empty());

    // every page resolves to itself
    editor.set_current_page(&added).unwrap();
    assert_eq!(editor.current_page_id(), Some(added.as_str()));
    editor.delete_page(&added).unwrap();
    assert_eq!(page_ids(&editor), [first.clone(), copy.clone()]);
    assert_eq!(editor.current_page_id(), Some(copy.as_str()));
}

#[test]
fn test_reloaded_project_mints_distinct_page_ids() {
    let storage = MemoryStorage::new();
    let mut editor = Editor::blank("site", "Site", EditorConfig::default());
    editor.add_page("Second").unwrap();
    editor.save(&storage).unwrap();

    let mut reopened = Editor::open(&storage, "site", EditorConfig::default()).unwrap();
    let third = reopened.add_page("Third").unwrap();
    let fourth = reopened.duplicate_page(&third).unwrap();
    assert_ne!(third, fourth);

    let ids: HashSet<String> = page_ids(&reopened).into_iter().collect();
    assert_eq!(ids.len(), 4);
    assert!(check_project(reopened.project()).is_empty());

    let node = reopened.create_node("Div");
    assert!(!reopened.project().all_ids().contains(&node.id));
}

#[test]
fn test_tree_reusing_a_page_id_is_rejected() {
    let mut editor = page_editor();
    let about = editor.add_page("About").unwrap();
    assert!(!editor.set_tree(vec![leaf(&about)]));
    assert!(!editor.set_tree(vec![leaf("home")]));
    assert_eq!(editor.get_tree()[0].id, "root");
}

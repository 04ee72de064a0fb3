use axil::{
    validate_hierarchy, ClusterOrder, HierarchyBuilder, Materializer, MemorySink, OrderEntry,
    PreferenceVector, VectorTable,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Minimal end-to-end: cluster order -> hierarchy -> materialized units.
    //
    // The order below is what a density-based subspace walk over three
    // dimensions might emit: two points tight along axis 0, one tight along
    // axis 1, and a shared refinement tight along both.
    let dim = 3;
    let mut order = ClusterOrder::new(dim);
    order.push(OrderEntry::start(1, PreferenceVector::from_dims(dim, &[0])))?;
    order.push(OrderEntry::new(
        2,
        1,
        0.21,
        PreferenceVector::from_dims(dim, &[0]),
    ))?;
    order.push(OrderEntry::new(
        3,
        2,
        0.68,
        PreferenceVector::from_dims(dim, &[1]),
    ))?;
    order.push(OrderEntry::new(
        4,
        3,
        0.35,
        PreferenceVector::from_dims(dim, &[0, 1]),
    ))?;

    let hierarchy = HierarchyBuilder::new(&order).build()?;

    let report = validate_hierarchy(&hierarchy);
    println!("{report}");
    println!();

    // Print the DAG: note the diamond — the {0, 1} cluster hangs under both
    // level-1 clusters.
    for cluster in hierarchy.iter() {
        let children: Vec<String> = cluster
            .children()
            .iter()
            .filter_map(|&id| hierarchy.get(id))
            .map(|c| c.identifier())
            .collect();
        println!(
            "{} level={} members={:?} children=[{}]",
            cluster.identifier(),
            cluster.level(),
            cluster.members(),
            children.join(", ")
        );
    }

    // Materialize into memory and dump each unit.
    let mut table = VectorTable::new();
    table.insert(1, vec![0.12, 0.80, 0.44], Some("p1".to_string()));
    table.insert(2, vec![0.13, 0.25, 0.47], Some("p2".to_string()));
    table.insert(3, vec![0.55, 0.26, 0.91], Some("p3".to_string()));
    table.insert(4, vec![0.14, 0.24, 0.12], Some("p4".to_string()));

    let mut sink = MemorySink::new();
    Materializer::new(&hierarchy, &order, &table)
        .with_header(vec!["### produced by extract_hierarchy".to_string()])
        .write_to(&mut sink)?;

    for name in sink.unit_names() {
        println!();
        println!("=== {name} ===");
        print!("{}", sink.contents(&name).unwrap());
    }

    Ok(())
}

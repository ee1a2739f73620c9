/// Builds a small index, runs a few queries and scores them against
/// hand-made relevance judgments.
///
/// Usage: cargo run --example evaluate_corpus [config.json]

use std::collections::BTreeMap;
use trovex::{evaluate, initialize, Analyzer, Config, DocId, IndexReader, IndexWriter, RelevanceJudgments, Searcher};

const CORPUS: &[(u64, &str)] = &[
    (1, "The cat sat on the mat and watched the birds."),
    (2, "A dog barked at the mailman every single morning."),
    (3, "Cats and dogs rarely share a sleeping mat."),
    (4, "Stock markets rallied as interest rates fell."),
    (5, "The central bank kept interest rates unchanged."),
    (6, "Running shoes for marathon runners on a budget."),
    (7, "She runs every morning before the markets open."),
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    initialize();

    let mut config = match std::env::args().nth(1) {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };
    let workdir = tempfile::tempdir()?;
    config.storage_path = workdir.path().join("index");

    let analyzer = Analyzer::new(config.analyzer.clone())?;
    let documents = CORPUS.iter().map(|(id, text)| (DocId(*id), text.as_bytes()));
    let report = IndexWriter::from_config(&config, analyzer)?.build(documents)?;
    println!(
        "indexed {} documents into {} segments ({} skipped) in {} ms",
        report.indexed, report.segments, report.skipped.len(), report.took_ms
    );

    let reader = IndexReader::open(&config.storage_path)?;
    let searcher = Searcher::for_index(&reader)?.with_fuzzy(config.fuzzy.clone())?;

    let queries: BTreeMap<u64, String> = [
        (1, "cat mat"),
        (2, "interest rates"),
        (3, "running"),
        (4, "mornin~1"),
    ]
    .into_iter()
    .map(|(id, q)| (id, q.to_string()))
    .collect();

    let gold = RelevanceJudgments::from_rows(
        [(1, 1), (1, 3), (2, 4), (2, 5), (3, 6), (3, 7), (4, 2), (4, 7)]
            .into_iter()
            .map(|(query, doc)| (query, DocId(doc))),
        &queries,
    );

    for (id, query) in &queries {
        let results = searcher.search(query, 3)?;
        let hits: Vec<String> = results.hits.iter()
            .map(|hit| format!("{}:{:.3}", hit.doc_id, hit.score))
            .collect();
        println!("q{} {:<16} -> [{}]", id, query, hits.join(", "));
    }

    let search_fn = |query: &str, k: usize| searcher.search(query, k).map(|results| results.doc_ids());
    let evaluation = evaluate(&queries, &gold, search_fn, &[1, 3, 5])?;
    for cutoff in &evaluation.cutoffs {
        println!("MAP@{} = {:.3}  MAR@{} = {:.3}", cutoff.k, cutoff.map, cutoff.k, cutoff.mar);
    }

    Ok(())
}

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;
use trovex::{build_index, fuzzy_search, search, Analyzer, DocId, IndexReader, Similarity};

const WORDS: &[&str] = &[
    "rust", "search", "engine", "index", "query", "segment", "posting", "term", "score", "ranking",
    "fuzzy", "stemming", "analyzer", "document", "corpus", "relevance", "precision", "recall",
    "checkpoint", "manifest", "compression", "dictionary", "automaton", "distance", "retrieval",
];

fn generate_corpus(docs: usize, words_per_doc: usize) -> Vec<(DocId, String)> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..docs)
        .map(|i| {
            let text: Vec<&str> = (0..words_per_doc)
                .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
                .collect();
            (DocId(i as u64), text.join(" "))
        })
        .collect()
}

fn build_reader(dir: &TempDir, docs: usize, analyzer: &Analyzer, similarity: Similarity) -> IndexReader {
    build_index(generate_corpus(docs, 50), dir.path().join("index"), analyzer, similarity, false, 1000).unwrap();
    IndexReader::open(dir.path().join("index")).unwrap()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_index");
    group.sample_size(10);
    let analyzer = Analyzer::stemming();

    for docs in [1_000, 5_000] {
        let corpus = generate_corpus(docs, 50);
        group.bench_with_input(BenchmarkId::from_parameter(docs), &corpus, |b, corpus| {
            b.iter(|| {
                let dir = TempDir::new().unwrap();
                build_index(corpus.iter().cloned(), dir.path().join("index"), &analyzer, Similarity::Bm25, true, 1000).unwrap()
            });
        });
    }

    group.finish();
}

fn bench_open(c: &mut Criterion) {
    let dir = TempDir::new().unwrap();
    let analyzer = Analyzer::stemming();
    build_reader(&dir, 5_000, &analyzer, Similarity::Bm25);
    let index = dir.path().join("index");

    c.bench_function("open_index_5000", |b| {
        b.iter(|| IndexReader::open(black_box(&index)).unwrap())
    });
}

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let dir = TempDir::new().unwrap();
    let analyzer = Analyzer::stemming();
    let reader = build_reader(&dir, 5_000, &analyzer, Similarity::Bm25);

    group.bench_function("single_term_bm25", |b| {
        b.iter(|| search(&reader, black_box("retrieval"), 10, Similarity::Bm25, &analyzer).unwrap())
    });

    group.bench_function("multi_term_bm25", |b| {
        b.iter(|| search(&reader, black_box("fuzzy search engine ranking"), 10, Similarity::Bm25, &analyzer).unwrap())
    });

    group.bench_function("multi_term_tfidf", |b| {
        b.iter(|| search(&reader, black_box("fuzzy search engine ranking"), 10, Similarity::TfIdf, &analyzer).unwrap())
    });

    group.bench_function("boolean_and", |b| {
        b.iter(|| search(&reader, black_box("rust AND index -corpus"), 10, Similarity::Bm25, &analyzer).unwrap())
    });

    group.bench_function("phrase", |b| {
        b.iter(|| search(&reader, black_box("\"search engine\""), 10, Similarity::Bm25, &analyzer).unwrap())
    });

    for max_edits in [1, 2] {
        group.bench_with_input(BenchmarkId::new("fuzzy", max_edits), &max_edits, |b, &max_edits| {
            b.iter(|| {
                fuzzy_search(&reader, black_box("serch engin"), 10, Similarity::Bm25, &analyzer, max_edits).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_open, bench_search);
criterion_main!(benches);

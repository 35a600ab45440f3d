//! Detection pipeline performance benchmarks.
//!
//! Measures schema extraction, value collection and end-to-end checking of
//! metadata tables against a controlled vocabulary.

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use curator::input::Parser;
use curator::schema::SchemaExtractor;
use curator::validation::ValueCollector;
use curator::{Curator, DiscrepancyDetector};
use std::io::Write;
use tempfile::NamedTempFile;

const ORGANS: &[&str] = &["colon", "ileum", "rectum", "stomach", "liver", "lung", "skin", "blood"];

/// Generate a data model with a vocabulary of `terms` organ names plus a
/// list-valued assay property.
fn generate_model(terms: usize) -> String {
    let mut graph = vec![
        serde_json::json!({
            "@id": "bts:Organ", "rdfs:label": "organ",
            "schema:rangeIncludes": (0..terms).map(|i| serde_json::json!({"@id": format!("bts:Organ{}", i)})).collect::<Vec<_>>()
        }),
        serde_json::json!({
            "@id": "bts:Assay", "rdfs:label": "assay",
            "sms:validationRules": ["list", "oneOf RNA-seq|ATAC-seq|WGS|WES|scRNA-seq"]
        }),
    ];
    for i in 0..terms {
        let name = match ORGANS.get(i) {
            Some(organ) => organ.to_string(),
            None => format!("organ {}", i),
        };
        graph.push(serde_json::json!({
            "@id": format!("bts:Organ{}", i),
            "sms:displayName": name,
            "sms:synonyms": [name.to_uppercase()]
        }));
    }
    serde_json::json!({"@context": {}, "@graph": graph}).to_string()
}

/// Generate realistic metadata TSV with a few misspellings per column.
fn generate_metadata(rows: usize) -> String {
    let organs = ["colon", "Colon", "ilium", "rectum", "stomach", "liver ", "lungs"];
    let assays = ["RNA-seq", "RNA-seq, ATAC-seq", "rnaseq", "WGS,wes", "scRNA-seq"];

    let mut data = String::from("sample_id\torgan\tassay\tnotes\n");
    for row in 0..rows {
        data.push_str(&format!(
            "SAMPLE_{:05}\t{}\t{}\tbatch {}\n",
            row + 1,
            organs[row % organs.len()],
            assays[row % assays.len()],
            row % 7
        ));
    }
    data
}

/// Benchmark schema extraction for growing vocabularies.
fn bench_schema_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("schema_extraction");

    for terms in [10, 100, 1000].iter() {
        let model = generate_model(*terms);

        group.throughput(Throughput::Bytes(model.len() as u64));
        group.bench_with_input(BenchmarkId::new("terms", terms), &model, |b, model| {
            b.iter(|| black_box(SchemaExtractor::new().extract_str(model).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark value collection and detection without suggestion scoring.
fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("detection");

    let catalog = SchemaExtractor::new().extract_str(&generate_model(100)).unwrap();

    for rows in [100, 1000, 10_000].iter() {
        let table = Parser::new().parse_str(&generate_metadata(*rows)).unwrap();

        group.throughput(Throughput::Elements(*rows as u64));
        group.bench_with_input(BenchmarkId::new("collect_rows", rows), &table, |b, table| {
            b.iter(|| black_box(ValueCollector::array(",").collect(table, 2)))
        });
        group.bench_with_input(BenchmarkId::new("detect_rows", rows), &table, |b, table| {
            b.iter(|| black_box(DiscrepancyDetector::new(&catalog).detect_table(table, None)))
        });
    }

    group.finish();
}

/// Benchmark the full check, from files to ranked suggestions.
fn bench_full_check(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_check");

    let mut model = NamedTempFile::with_suffix(".jsonld").unwrap();
    model.write_all(generate_model(100).as_bytes()).unwrap();
    let schema = model.path().to_string_lossy().to_string();

    for rows in [100, 1000, 10_000].iter() {
        let data = generate_metadata(*rows);

        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("metadata_rows", rows), &data, |b, data| {
            b.iter_with_setup(
                || {
                    let mut temp = NamedTempFile::with_suffix(".tsv").unwrap();
                    temp.write_all(data.as_bytes()).unwrap();
                    temp
                },
                |temp| black_box(Curator::new().check(temp.path(), &schema).unwrap()),
            )
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_schema_extraction,
    bench_detection,
    bench_full_check,
);

criterion_main!(benches);

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use alnstitch::aln_config::{AlnConfig, AlnConfigBuilder, DirectionStorage};
use alnstitch::example_gen::{generate_amplicons, generate_pairs};
use alnstitch::hirschberg::hirschberg_align;
use alnstitch::needleman::needleman_align;
use alnstitch::sequence::Sequence;
use alnstitch::stitch::AmpliconStitcher;
use alnstitch::waterman::{memory_waterman, waterman_align};

pub fn bench_pairwise(c: &mut Criterion) {
    let seq_lens = [100, 1000];
    let error_rates = [0.01, 0.05];
    let storages = [DirectionStorage::Packed, DirectionStorage::Byte];

    let mut benchmark_group = c.benchmark_group("pairwise-group");
    benchmark_group.sample_size(10);

    for &sl in seq_lens.iter() {
        for &er in error_rates.iter() {
            let pairs: Vec<(Sequence, Sequence)> = generate_pairs(sl, 1, er, 0).into_iter()
                .map(|(r, q)| (Sequence::new("ref", &r).unwrap(), Sequence::new("qry", &q).unwrap()))
                .collect();
            let (reference, query) = &pairs[0];

            for &storage in storages.iter() {
                let config = AlnConfigBuilder::default()
                    .direction_storage(storage)
                    .build().unwrap();
                let test_label = format!("needleman_{sl}_{er}_{storage:?}");
                benchmark_group.bench_function(&test_label, |b| b.iter(|| {
                    black_box(needleman_align(reference, query, &config).unwrap())
                }));
                let test_label = format!("waterman_{sl}_{er}_{storage:?}");
                benchmark_group.bench_function(&test_label, |b| b.iter(|| {
                    black_box(waterman_align(reference, query, &config).unwrap())
                }));
            }

            let config = AlnConfig::default();
            let test_label = format!("memory_waterman_{sl}_{er}");
            benchmark_group.bench_function(&test_label, |b| b.iter(|| {
                black_box(memory_waterman(reference, query, &config).unwrap())
            }));
            let test_label = format!("hirschberg_{sl}_{er}");
            benchmark_group.bench_function(&test_label, |b| b.iter(|| {
                black_box(hirschberg_align(reference, query, &config).unwrap())
            }));
        }
    }

    benchmark_group.finish();
}

pub fn bench_stitch(c: &mut Criterion) {
    let ref_lens = [1000, 10000];
    let copies = [10, 30];
    let error_rate = 0.02;

    let mut benchmark_group = c.benchmark_group("stitch-group");
    benchmark_group.sample_size(10);

    for &rl in ref_lens.iter() {
        for &cp in copies.iter() {
            let (_reference, amplicons) = generate_amplicons(rl, 400, 200, cp, error_rate);
            let test_label = format!("stitch_{rl}x{cp}_{error_rate}");
            benchmark_group.bench_function(&test_label, |b| b.iter(|| {
                black_box({
                    let mut stitcher = AmpliconStitcher::new();
                    for (aligned, start) in amplicons.iter() {
                        stitcher.add_amplicon(aligned, *start).unwrap();
                    }
                    stitcher.consensus().unwrap()
                });
            }));
        }
    }

    benchmark_group.finish();
}

criterion_group!(benches, bench_pairwise, bench_stitch);
criterion_main!(benches);

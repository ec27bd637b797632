use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use export_letterhead::types::{row, CellValue};
use export_letterhead::{
    compose, CsvParams, ExportLetterheadSettings, ExportParams, LetterheadExporter,
    SessionContext, TemplateContext,
};

const TEMPLATE: &str = "{{ company }}\n{{ doctype }} | {{ report_name or doctype }}\nGenerated {{ now.strftime('%d %b %Y') }}";

fn session() -> SessionContext {
    let now = NaiveDate::from_ymd_opt(2025, 1, 15)
        .unwrap()
        .and_hms_opt(14, 30, 0)
        .unwrap();
    SessionContext::new("jdoe@example.com")
        .with_user_fullname("John Doe")
        .with_company("Acme")
        .at(now)
}

fn data(size: usize) -> Vec<Vec<CellValue>> {
    let mut rows = vec![row(["ID", "Name", "Value"])];
    for i in 0..size {
        rows.push(vec![
            CellValue::Int(i as i64),
            CellValue::String(format!("Name_{}", i)),
            CellValue::Float(i as f64 * 1.5),
        ]);
    }
    rows
}

fn benchmark_compose(c: &mut Criterion) {
    let now = NaiveDate::from_ymd_opt(2025, 1, 15)
        .unwrap()
        .and_hms_opt(14, 30, 0)
        .unwrap();
    let ctx = TemplateContext::new("Acme", "Sales Invoice", "John Doe", now);
    let settings = ExportLetterheadSettings::with_template(TEMPLATE);

    c.bench_function("compose", |b| {
        b.iter(|| compose(black_box(&settings), black_box(&ctx)));
    });
}

fn benchmark_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("export");
    group.sample_size(10);

    let exporter = LetterheadExporter::new(ExportLetterheadSettings::with_template(TEMPLATE), session());
    let params = ExportParams::report_view("Sales Invoice", None);

    for size in [100, 1000, 10000].iter() {
        let rows = data(*size);

        group.bench_with_input(BenchmarkId::new("xlsx", size), &rows, |b, rows| {
            b.iter(|| {
                exporter
                    .export_xlsx(&params, "Sales Invoice", black_box(rows))
                    .unwrap()
            });
        });

        group.bench_with_input(BenchmarkId::new("csv", size), &rows, |b, rows| {
            b.iter(|| {
                exporter
                    .export_csv(&params, black_box(rows), CsvParams::default())
                    .unwrap()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_compose, benchmark_export);
criterion_main!(benches);

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use stockroom_core::{ProductId, RequisitionId, UserId};
use stockroom_infra::spreadsheet::read_product_rows;
use stockroom_inventory::{
    MovementFilter, MovementKind, NewProduct, NewRequisition, Product, Requester, RequisitionCode,
    RequisitionKind, StockMovement, apply_movement, approve, parse_row, summarize,
};

fn product(name: String, stock: i64) -> Product {
    NewProduct {
        name,
        stock_on_hand: stock,
        minimum_stock: 5,
        unit_price: Decimal::new(1999, 2),
    }
    .into_product(ProductId::new(), Utc::now())
    .unwrap()
}

fn reviewer() -> Requester {
    Requester {
        user_id: UserId::new(),
        username: "reviewer".to_string(),
    }
}

fn bench_transitions(c: &mut Criterion) {
    let p = product("Gloves".to_string(), 1_000_000);
    let now = Utc::now();

    c.bench_function("ledger/apply_movement", |b| {
        b.iter(|| apply_movement(black_box(&p), MovementKind::Outbound, black_box(3), now).unwrap())
    });

    let requisition = NewRequisition {
        kind: RequisitionKind::Withdrawal,
        product_id: p.id,
        requester: reviewer(),
        quantity: 4,
        note: None,
    }
    .into_requisition(RequisitionId::new(), RequisitionCode::generate(), now)
    .unwrap();
    let who = reviewer();

    c.bench_function("ledger/approve", |b| {
        b.iter(|| approve(black_box(&requisition), black_box(&p), &who, now).unwrap())
    });
}

fn bench_dashboard(c: &mut Criterion) {
    let mut group = c.benchmark_group("dashboard/summarize");
    let products: Vec<Product> = (0..200).map(|i| product(format!("Product {i}"), 1_000_000)).collect();
    let start = Utc::now() - Duration::days(365);

    for size in [1_000usize, 10_000, 100_000] {
        let movements: Vec<StockMovement> = (0..size)
            .map(|i| {
                let kind = if i % 3 == 0 { MovementKind::Outbound } else { MovementKind::Inbound };
                let p = &products[i % products.len()];
                apply_movement(p, kind, 1, start + Duration::minutes(i as i64))
                    .unwrap()
                    .movement
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &movements, |b, movements| {
            b.iter(|| summarize(&products, movements, &[], MovementFilter::default()))
        });
    }
    group.finish();
}

fn bench_import(c: &mut Criterion) {
    let mut sheet = String::from("Name,Stock,Minimum Stock,Unit Price\n");
    for i in 0..5_000 {
        sheet.push_str(&format!("Item {i},{},{},{}.50\n", i % 90, i % 7, i % 40));
    }

    let mut group = c.benchmark_group("import");
    group.throughput(Throughput::Elements(5_000));
    group.bench_function("read_and_parse_rows", |b| {
        b.iter(|| {
            let rows = read_product_rows(black_box(&sheet)).unwrap();
            rows.iter().filter(|r| matches!(parse_row(r), Ok(Some(_)))).count()
        })
    });
    group.finish();
}

criterion_group!(benches, bench_transitions, bench_dashboard, bench_import);
criterion_main!(benches);

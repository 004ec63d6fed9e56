//! Solver benchmarks.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use trellis_solver::{Constraint, ConstraintId, Solver, Strength, Variable};

const BOXES: usize = 100;

/// A row of boxes separated by fixed gaps, each preferring a width of 50,
/// squeezed into a container whose right edge is pinned by a strong edit.
fn build_row(solver: &mut Solver) -> (Vec<Variable>, ConstraintId) {
    let mut lefts = Vec::with_capacity(BOXES);
    let mut widths = Vec::with_capacity(BOXES);
    for _ in 0..BOXES {
        lefts.push(solver.new_variable());
        widths.push(solver.new_variable());
    }

    solver.add(Constraint::equal(lefts[0], 0.0)).unwrap();
    for i in 0..BOXES {
        solver
            .add(Constraint::greater_or_equal(widths[i], 0.0))
            .unwrap();
        solver
            .add(Constraint::equal(widths[i], 50.0).with_strength(Strength::WEAK))
            .unwrap();
        if i + 1 < BOXES {
            solver
                .add(Constraint::equal(lefts[i + 1], lefts[i] + widths[i] + 10.0))
                .unwrap();
        }
    }
    let container = solver
        .add(
            Constraint::equal(lefts[BOXES - 1] + widths[BOXES - 1], 4000.0)
                .with_strength(Strength::STRONG),
        )
        .unwrap();
    (widths, container)
}

fn add_row(c: &mut Criterion) {
    c.bench_function("add_row", |b| {
        b.iter(|| {
            let mut solver = Solver::new();
            let (widths, _) = build_row(&mut solver);
            solver.solve().unwrap();
            black_box(solver.value(widths[0]))
        })
    });
}

fn edit_container(c: &mut Criterion) {
    let mut solver = Solver::new();
    let (widths, container) = build_row(&mut solver);
    solver.solve().unwrap();

    let mut right = 4000.0;
    c.bench_function("edit_container", |b| {
        b.iter(|| {
            right = if right > 6000.0 { 4000.0 } else { right + 25.0 };
            solver.update_constant(container, black_box(right));
            solver.solve().unwrap();
            black_box(solver.value(widths[BOXES - 1]))
        })
    });
}

fn change_strength(c: &mut Criterion) {
    let mut solver = Solver::new();
    let (widths, container) = build_row(&mut solver);
    solver.solve().unwrap();

    let mut strong = true;
    c.bench_function("change_strength", |b| {
        b.iter(|| {
            strong = !strong;
            let strength = if strong { Strength::STRONG } else { Strength::WEAK };
            solver.update_strength(container, strength).unwrap();
            solver.solve().unwrap();
            black_box(solver.value(widths[0]))
        })
    });
}

criterion_group!(benches, add_row, edit_container, change_strength);
criterion_main!(benches);

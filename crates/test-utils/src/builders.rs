use dagrun::DependencyMap;

/// Build a dependency table from `(task, prerequisites)` pairs.
///
/// ```text
/// deps(&[("a", &[]), ("c", &["a", "b"])])
/// ```
pub fn deps(table: &[(&'static str, &[&'static str])]) -> DependencyMap<&'static str> {
    table
        .iter()
        .map(|(task, prereqs)| (*task, prereqs.to_vec()))
        .collect()
}

/// Task names `t0..tN`, leaked so they can be used as `&'static str` tasks.
pub fn numbered_tasks(count: usize) -> Vec<&'static str> {
    (0..count)
        .map(|i| &*Box::leak(format!("t{i}").into_boxed_str()))
        .collect()
}

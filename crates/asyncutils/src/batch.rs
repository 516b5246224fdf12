use futures::future::join_all;
use std::future::Future;

/// Runs `f` over `items` in sequential batches of `batch_size`.
///
/// Every future of a batch is created up front and awaited as a group, so the
/// work inside a batch runs concurrently while batch `N + 1` is not started
/// until every future of batch `N` has resolved. Results are returned in input
/// order.
///
/// A failing future does not cancel its siblings: the whole batch is driven to
/// completion and the first error (in input order) is returned afterwards.
/// No later batch is started once an error has been observed.
///
/// A `batch_size` of zero is treated as one.
///
/// # Examples
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let doubled = swgen_asyncutils::try_in_batches(1..=5, 2, |n| async move { Ok::<_, ()>(n * 2) })
///     .await
///     .unwrap();
/// assert_eq!(doubled, [2, 4, 6, 8, 10]);
/// # }
/// ```
pub async fn try_in_batches<I, F, Fut, T, E>(items: I, batch_size: usize, mut f: F) -> Result<Vec<T>, E>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let batch_size = batch_size.max(1);
    let mut items = items.into_iter();
    let mut output = Vec::new();
    let mut batch_number = 0usize;
    loop {
        let batch: Vec<Fut> = items.by_ref().take(batch_size).map(&mut f).collect();
        if batch.is_empty() {
            break;
        }
        batch_number += 1;
        tracing::trace!(batch = batch_number, size = batch.len(), "Starting batch");
        for result in join_all(batch).await {
            output.push(result?);
        }
    }
    Ok(output)
}

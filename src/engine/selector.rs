use std::collections::HashSet;

use crate::content::Question;
use crate::engine::shuffle::{Shuffler, shuffled};

/// Choose the questions for one quiz session.
///
/// Unmastered questions come first and mastered ones fill whatever room is
/// left; each group is shuffled on its own. An empty result means the era has
/// nothing to play.
pub fn select_working_set(
    pool: &[Question],
    mastered_ids: &HashSet<String>,
    max_size: usize,
    shuffler: &mut dyn Shuffler,
) -> Vec<Question> {
    let (mastered, unmastered): (Vec<Question>, Vec<Question>) = pool
        .iter()
        .cloned()
        .partition(|q| mastered_ids.contains(&q.id));

    let mut selected = shuffled(shuffler, unmastered);
    selected.extend(shuffled(shuffler, mastered));
    selected.truncate(max_size);
    selected
}

//! Post-processing passes over raw edit scripts: merging adjacent runs,
//! stripping semantically meaningless equalities, and folding edits that are
//! too close together to be worth keeping apart.

use super::{Difference, EditType};
use crate::commonality::{common_prefix_bytes, common_suffix_bytes};

/// Collapse adjacent runs of the same type, factor shared prefixes/suffixes
/// out of delete/insert pairs, and slide lone edits so they merge with their
/// surrounding equalities. Idempotent.
pub fn cleanup_merge(diffs: &mut Vec<Difference>) {
    if diffs.is_empty() {
        return;
    }

    diffs.push(Difference::equal(""));
    let mut pointer = 0;
    let mut count_delete = 0;
    let mut count_insert = 0;
    let mut text_delete = String::new();
    let mut text_insert = String::new();

    while pointer < diffs.len() {
        match diffs[pointer].kind {
            EditType::Insert => {
                count_insert += 1;
                text_insert.push_str(&diffs[pointer].text);
                pointer += 1;
            }
            EditType::Delete => {
                count_delete += 1;
                text_delete.push_str(&diffs[pointer].text);
                pointer += 1;
            }
            EditType::Equal => {
                if count_delete + count_insert > 1 {
                    if count_delete != 0 && count_insert != 0 {
                        // Factor out a shared prefix into the preceding
                        // equality (creating one if needed).
                        let common = common_prefix_bytes(&text_insert, &text_delete);
                        if common != 0 {
                            let shared = text_insert[..common].to_string();
                            let first = pointer - count_delete - count_insert;
                            if first > 0 && diffs[first - 1].kind == EditType::Equal {
                                diffs[first - 1].text.push_str(&shared);
                            } else {
                                diffs.insert(0, Difference::equal(shared));
                                pointer += 1;
                            }
                            text_insert.drain(..common);
                            text_delete.drain(..common);
                        }
                        // Factor out a shared suffix into the current equality.
                        let common = common_suffix_bytes(&text_insert, &text_delete);
                        if common != 0 {
                            let mut shared =
                                text_insert[text_insert.len() - common..].to_string();
                            shared.push_str(&diffs[pointer].text);
                            diffs[pointer].text = shared;
                            text_insert.truncate(text_insert.len() - common);
                            text_delete.truncate(text_delete.len() - common);
                        }
                    }
                    // Replace the mixed run with at most one delete and one
                    // insert.
                    let first = pointer - count_delete - count_insert;
                    let mut merged = Vec::with_capacity(2);
                    if !text_delete.is_empty() {
                        merged.push(Difference::delete(text_delete.clone()));
                    }
                    if !text_insert.is_empty() {
                        merged.push(Difference::insert(text_insert.clone()));
                    }
                    let merged_len = merged.len();
                    diffs.splice(first..pointer, merged);
                    pointer = first + merged_len + 1;
                } else if pointer != 0 && diffs[pointer - 1].kind == EditType::Equal {
                    let text = diffs.remove(pointer).text;
                    diffs[pointer - 1].text.push_str(&text);
                } else {
                    pointer += 1;
                }
                count_insert = 0;
                count_delete = 0;
                text_delete.clear();
                text_insert.clear();
            }
        }
    }
    if diffs.last().is_some_and(|d| d.text.is_empty()) {
        diffs.pop();
    }

    // Single edits surrounded by equalities can sometimes be shifted sideways
    // to eliminate one of the equalities, e.g. A<ins>BA</ins>C -> <ins>AB</ins>AC.
    let mut changes = false;
    let mut pointer = 1;
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].kind == EditType::Equal && diffs[pointer + 1].kind == EditType::Equal
        {
            let prev = diffs[pointer - 1].text.clone();
            let next = diffs[pointer + 1].text.clone();
            if diffs[pointer].text.ends_with(&prev) {
                let trimmed_len = diffs[pointer].text.len() - prev.len();
                let mut shifted = prev.clone();
                shifted.push_str(&diffs[pointer].text[..trimmed_len]);
                diffs[pointer].text = shifted;
                let mut grown = prev;
                grown.push_str(&next);
                diffs[pointer + 1].text = grown;
                diffs.remove(pointer - 1);
                changes = true;
            } else if diffs[pointer].text.starts_with(&next) {
                diffs[pointer - 1].text.push_str(&next);
                let mut shifted = diffs[pointer].text[next.len()..].to_string();
                shifted.push_str(&next);
                diffs[pointer].text = shifted;
                diffs.remove(pointer + 1);
                changes = true;
            }
        }
        pointer += 1;
    }
    // A shift can cascade into further merges.
    if changes {
        cleanup_merge(diffs);
    }
}

/// Remove chaff: equalities which are shorter than the edits on both sides
/// get folded into the surrounding edit, producing a diff that reads as one
/// replacement instead of many slivers. Runs backwards where needed since one
/// elimination can enable another, then re-aligns edit boundaries to
/// word/line breaks.
pub fn cleanup_semantic(diffs: &mut Vec<Difference>) {
    if diffs.is_empty() {
        return;
    }

    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    let mut pointer = 0;
    // Number of chars changed before and after the candidate equality.
    let mut length_insertions1 = 0;
    let mut length_deletions1 = 0;
    let mut length_insertions2 = 0;
    let mut length_deletions2 = 0;

    while pointer < diffs.len() {
        if diffs[pointer].kind == EditType::Equal {
            equalities.push(pointer);
            length_insertions1 = length_insertions2;
            length_deletions1 = length_deletions2;
            length_insertions2 = 0;
            length_deletions2 = 0;
            last_equality = Some(diffs[pointer].text.clone());
            pointer += 1;
        } else {
            if diffs[pointer].kind == EditType::Insert {
                length_insertions2 += diffs[pointer].char_len();
            } else {
                length_deletions2 += diffs[pointer].char_len();
            }
            let worth_eliminating = last_equality.as_ref().is_some_and(|eq| {
                let len = eq.chars().count();
                len <= length_insertions1.max(length_deletions1)
                    && len <= length_insertions2.max(length_deletions2)
            });
            if worth_eliminating {
                let equality = last_equality.take().unwrap();
                let at = *equalities.last().unwrap();
                // Duplicate the equality as a deletion and an insertion.
                diffs.insert(at, Difference::delete(equality.clone()));
                diffs[at + 1] = Difference::insert(equality);
                // Throw away the eliminated equality and the one before it,
                // which now needs re-evaluation.
                equalities.pop();
                equalities.pop();
                pointer = equalities.last().map_or(0, |&p| p + 1);
                length_insertions1 = 0;
                length_deletions1 = 0;
                length_insertions2 = 0;
                length_deletions2 = 0;
                changes = true;
            } else {
                pointer += 1;
            }
        }
    }

    if changes {
        cleanup_merge(diffs);
    }
    cleanup_semantic_lossless(diffs);
}

/// Slide edit boundaries (without changing the net effect) towards the most
/// readable split: blank lines beat line breaks beat sentence ends beat
/// whitespace beat punctuation.
pub(crate) fn cleanup_semantic_lossless(diffs: &mut Vec<Difference>) {
    let mut pointer = 1;
    while pointer + 1 < diffs.len() {
        if diffs[pointer - 1].kind == EditType::Equal && diffs[pointer + 1].kind == EditType::Equal
        {
            let mut equality1 = diffs[pointer - 1].text.clone();
            let mut edit = diffs[pointer].text.clone();
            let mut equality2 = diffs[pointer + 1].text.clone();

            // Shift the edit as far left as it will go.
            let offset = common_suffix_bytes(&equality1, &edit);
            if offset != 0 {
                let shared = edit[edit.len() - offset..].to_string();
                equality1.truncate(equality1.len() - offset);
                let mut shifted = shared.clone();
                shifted.push_str(&edit[..edit.len() - offset]);
                edit = shifted;
                let mut grown = shared;
                grown.push_str(&equality2);
                equality2 = grown;
            }

            // Step rightwards char by char, keeping the best-scoring split.
            let mut best_equality1 = equality1.clone();
            let mut best_edit = edit.clone();
            let mut best_equality2 = equality2.clone();
            let mut best_score =
                semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
            loop {
                let (Some(e), Some(q)) = (edit.chars().next(), equality2.chars().next()) else {
                    break;
                };
                if e != q {
                    break;
                }
                equality1.push(e);
                let mut shifted = edit[e.len_utf8()..].to_string();
                shifted.push(q);
                edit = shifted;
                equality2 = equality2[q.len_utf8()..].to_string();
                let score = semantic_score(&equality1, &edit) + semantic_score(&edit, &equality2);
                // >= favours the rightmost split among ties.
                if score >= best_score {
                    best_score = score;
                    best_equality1 = equality1.clone();
                    best_edit = edit.clone();
                    best_equality2 = equality2.clone();
                }
            }

            if diffs[pointer - 1].text != best_equality1 {
                if !best_equality1.is_empty() {
                    diffs[pointer - 1].text = best_equality1;
                } else {
                    diffs.remove(pointer - 1);
                    pointer -= 1;
                }
                diffs[pointer].text = best_edit;
                if !best_equality2.is_empty() {
                    diffs[pointer + 1].text = best_equality2;
                } else {
                    diffs.remove(pointer + 1);
                }
            }
        }
        pointer += 1;
    }
}

// Score a split between `one` and `two` by how natural the boundary is.
// 6 is a clean edge, 5 a blank line, 4 a line break, 3 the end of a
// sentence, 2 whitespace, 1 other punctuation, 0 mid-word.
fn semantic_score(one: &str, two: &str) -> u32 {
    if one.is_empty() || two.is_empty() {
        return 6;
    }

    let char1 = one.chars().next_back().unwrap();
    let char2 = two.chars().next().unwrap();
    let non_alnum1 = !char1.is_alphanumeric();
    let non_alnum2 = !char2.is_alphanumeric();
    let whitespace1 = non_alnum1 && char1.is_whitespace();
    let whitespace2 = non_alnum2 && char2.is_whitespace();
    let line_break1 = whitespace1 && (char1 == '\n' || char1 == '\r');
    let line_break2 = whitespace2 && (char2 == '\n' || char2 == '\r');
    let blank_line1 = line_break1 && (one.ends_with("\n\n") || one.ends_with("\n\r\n"));
    let blank_line2 = line_break2
        && (two.starts_with("\n\n")
            || two.starts_with("\n\r\n")
            || two.starts_with("\r\n\n")
            || two.starts_with("\r\n\r\n"));

    if blank_line1 || blank_line2 {
        5
    } else if line_break1 || line_break2 {
        4
    } else if non_alnum1 && !whitespace1 && whitespace2 {
        3
    } else if whitespace1 || whitespace2 {
        2
    } else if non_alnum1 || non_alnum2 {
        1
    } else {
        0
    }
}

/// Fold edit groups separated by equalities shorter than `edit_cost` chars
/// into a single replacement when keeping them apart costs more than it
/// saves.
pub fn cleanup_efficiency(diffs: &mut Vec<Difference>, edit_cost: usize) {
    if diffs.is_empty() {
        return;
    }

    let mut changes = false;
    let mut equalities: Vec<usize> = Vec::new();
    let mut last_equality: Option<String> = None;
    let mut pointer = 0;
    // Is there an insertion/deletion on each side of the candidate equality?
    let mut pre_ins = false;
    let mut pre_del = false;
    let mut post_ins = false;
    let mut post_del = false;

    while pointer < diffs.len() {
        if diffs[pointer].kind == EditType::Equal {
            if diffs[pointer].char_len() < edit_cost && (post_ins || post_del) {
                equalities.push(pointer);
                pre_ins = post_ins;
                pre_del = post_del;
                last_equality = Some(diffs[pointer].text.clone());
            } else {
                // Not a candidate and can never become one.
                equalities.clear();
                last_equality = None;
            }
            post_ins = false;
            post_del = false;
            pointer += 1;
        } else {
            if diffs[pointer].kind == EditType::Delete {
                post_del = true;
            } else {
                post_ins = true;
            }
            // Splitting is worth it when edits surround the equality on all
            // four sides, or on three sides around a very short equality.
            let worth_eliminating = last_equality.as_ref().is_some_and(|eq| {
                let sides = usize::from(pre_ins)
                    + usize::from(pre_del)
                    + usize::from(post_ins)
                    + usize::from(post_del);
                (pre_ins && pre_del && post_ins && post_del)
                    || (eq.chars().count() < edit_cost / 2 && sides == 3)
            });
            if worth_eliminating {
                let equality = last_equality.take().unwrap();
                let at = *equalities.last().unwrap();
                diffs.insert(at, Difference::delete(equality.clone()));
                diffs[at + 1] = Difference::insert(equality);
                equalities.pop();
                changes = true;
                if pre_ins && pre_del {
                    // No equalities left to fall back to; scan onwards.
                    post_ins = true;
                    post_del = true;
                    equalities.clear();
                    pointer += 1;
                } else {
                    // Re-evaluate from the previous candidate.
                    equalities.pop();
                    pointer = equalities.last().map_or(0, |&p| p + 1);
                    post_ins = false;
                    post_del = false;
                }
            } else {
                pointer += 1;
            }
        }
    }

    if changes {
        cleanup_merge(diffs);
    }
}

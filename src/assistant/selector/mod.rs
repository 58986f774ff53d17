
use crate::assistant::models::ResolvedProduct;

/// Pick the product to show next to `reply_text`.
///
/// The first candidate whose name appears in the reply (ignoring case) wins;
/// when none is mentioned the top-ranked candidate is used. Returns `None`
/// only for an empty candidate list.
#[inline]
pub fn select_product<'a>(
    reply_text: &str,
    candidates: &'a [ResolvedProduct],
) -> Option<&'a ResolvedProduct> {
    let reply = reply_text.to_lowercase();
    candidates
        .iter()
        .find(|candidate| {
            !candidate.name.is_empty() && reply.contains(&candidate.name.to_lowercase())
        })
        .or_else(|| candidates.first())
}

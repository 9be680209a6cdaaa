//! Line-item targeting values for a winning bid.

use crate::auction::{Size, Targeting};
use crate::settings::TargetingKeys;

/// Build the `id`/`om` or `id`/`pm`/`pmid` entries for one bid.
///
/// Values are single-element lists prefixed with the size key, e.g.
/// `ix_consumable_cpm -> ["300x250_4.00"]`. An empty deal id counts as no deal.
#[must_use]
pub fn line_item_targeting(
    keys: &TargetingKeys,
    size: Size,
    request_id: &str,
    deal_id: Option<&str>,
    formatted_price: &str,
) -> Targeting {
    let mut targeting = Targeting::new();

    match deal_id.filter(|deal| !deal.is_empty()) {
        Some(deal) => {
            targeting.insert(keys.pmid.clone(), vec![format!("{size}_{deal}")]);
            targeting.insert(keys.pm.clone(), vec![format!("{size}_{formatted_price}")]);
        }
        None => {
            targeting.insert(keys.om.clone(), vec![format!("{size}_{formatted_price}")]);
        }
    }
    targeting.insert(keys.id.clone(), vec![request_id.to_string()]);

    targeting
}

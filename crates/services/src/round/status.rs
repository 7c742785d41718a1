use round_core::model::find_by_name;

use crate::error::RegistryError;
use crate::registry::PlayerRegistry;

/// Registry view of whether `name` already finished a round.
///
/// `Ok(None)` means the registry has no record for the player.
///
/// # Errors
///
/// Returns `RegistryError` if the collection cannot be fetched.
pub async fn fetch_completion(
    registry: &dyn PlayerRegistry,
    name: &str,
) -> Result<Option<bool>, RegistryError> {
    let players = registry.list_players().await?;
    Ok(find_by_name(&players, name).map(|record| record.is_complete))
}

use std::sync::Arc;

use crate::{
    db::{GameStore, RentalLedger},
    error::{AppError, AppResult},
    models::{RentOutcome, ReturnOutcome},
};

/// Renting and returning games
///
/// The availability flag only ever moves through the store's compare-and-set,
/// so two users racing for the same game cannot both win.
pub struct RentalService {
    games: Arc<dyn GameStore>,
    ledger: Arc<dyn RentalLedger>,
}

impl RentalService {
    pub fn new(games: Arc<dyn GameStore>, ledger: Arc<dyn RentalLedger>) -> Self {
        Self { games, ledger }
    }

    pub async fn rent(&self, user_id: &str, title: &str) -> AppResult<RentOutcome> {
        let Some(game) = self.games.find_by_title(title).await? else {
            return Ok(RentOutcome::NotFound);
        };

        match self.games.transition_rented(game.id, true).await {
            Ok(()) => {}
            Err(AppError::ConflictingState(_)) => {
                tracing::info!(user_id, title, "Rent refused, game already rented");
                return Ok(RentOutcome::AlreadyRented);
            }
            Err(AppError::NotFound(_)) => return Ok(RentOutcome::NotFound),
            Err(e) => return Err(e),
        }

        if let Err(e) = self.ledger.add_rental(user_id, game.id).await {
            // Put the flag back so the game does not end up rented by nobody
            if let Err(rollback) = self.games.transition_rented(game.id, false).await {
                tracing::error!(error = %rollback, game_id = game.id, "Failed to roll back rental flag");
            }
            return Err(e);
        }

        tracing::info!(user_id, title, game_id = game.id, "Game rented");
        Ok(RentOutcome::Rented)
    }

    pub async fn return_game(&self, user_id: &str, title: &str) -> AppResult<ReturnOutcome> {
        let Some(game) = self.games.find_by_title(title).await? else {
            return Ok(ReturnOutcome::NotFound);
        };

        let rented = self.ledger.rented_game_ids(user_id).await?;
        if !rented.contains(&game.id) {
            return Ok(ReturnOutcome::NotRentedByYou);
        }

        match self.games.transition_rented(game.id, false).await {
            Ok(()) => {}
            Err(AppError::ConflictingState(_)) => {
                tracing::warn!(user_id, title, "Return refused, game is not rented");
                return Ok(ReturnOutcome::NotRentedByYou);
            }
            Err(AppError::NotFound(_)) => return Ok(ReturnOutcome::NotFound),
            Err(e) => return Err(e),
        }

        if let Err(e) = self.ledger.remove_rental(user_id, game.id).await {
            // The ledger still lists the game, so the flag must say rented too
            if let Err(rollback) = self.games.transition_rented(game.id, true).await {
                tracing::error!(error = %rollback, game_id = game.id, "Failed to roll back return flag");
            }
            return Err(e);
        }

        tracing::info!(user_id, title, game_id = game.id, "Game returned");
        Ok(ReturnOutcome::Returned)
    }
}

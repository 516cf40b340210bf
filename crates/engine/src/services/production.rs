//! Production costing: FIFO cost previews and production runs.
//!
//! Both operations simulate the run the same way: read each ingredient's
//! lots, plan a FIFO draw, and sum the plan costs. A production run then
//! applies exactly the plans it priced.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use tracing::{debug, info, instrument, warn};

use lot_costing_core::{Name, QuantityError, checked_sum, non_negative, positive};

use super::Inventory;
use super::availability::{run_requirements, shortage};
use crate::db::{BatchRepository, LotRepository, RepositoryError};
use crate::error::InventoryError;
use crate::fifo::{self, ConsumptionPlan};
use crate::models::{
    CostPreview, CreateBatchInput, IngredientCost, ProductionOutcome, ProductionRequest,
    Requirement, Shortage,
};

/// FIFO plans for every requirement of a run.
struct Simulation {
    plans: Vec<ConsumptionPlan>,
    shortages: Vec<Shortage>,
}

impl Simulation {
    fn raw_total(&self) -> Result<Decimal, QuantityError> {
        let costs = self
            .plans
            .iter()
            .map(ConsumptionPlan::cost)
            .collect::<Result<Vec<_>, _>>()?;
        checked_sum("total cost", costs)
    }

    fn ingredients(&self) -> Result<Vec<IngredientCost>, QuantityError> {
        self.plans
            .iter()
            .map(|plan| {
                Ok(IngredientCost {
                    ingredient: plan.item.clone(),
                    required: plan.required,
                    consumed: plan.consumed(),
                    cost: plan.cost()?,
                })
            })
            .collect()
    }
}

async fn simulate(
    conn: &mut SqliteConnection,
    requirements: &[Requirement],
) -> Result<Simulation, RepositoryError> {
    let mut lots = LotRepository::new(conn);
    let mut plans = Vec::with_capacity(requirements.len());
    let mut shortages = Vec::new();

    for requirement in requirements {
        let open = lots.lots_for(&requirement.ingredient).await?;
        let available = checked_sum("stock quantity", open.iter().map(|lot| lot.quantity))?;
        shortages.extend(shortage(requirement, available));

        let plan = fifo::plan(&requirement.ingredient, &open, requirement.quantity);
        let cost = plan.cost()?;
        debug!(
            ingredient = %plan.item,
            required = %plan.required,
            draws = plan.draws.len(),
            %cost,
            "Planned FIFO draw"
        );
        plans.push(plan);
    }

    Ok(Simulation { plans, shortages })
}

impl Inventory {
    /// Quote the material cost of `quantity` units of `product` without
    /// touching stock.
    ///
    /// When stock is short the quote covers only what is available and the
    /// shortages are listed in the preview.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::InvalidQuantity` if `quantity` is not
    /// positive or a cost figure overflows, and `InventoryError::InvalidName`
    /// for a blank product.
    #[instrument(skip(self))]
    pub async fn preview_cost(
        &self,
        product: &str,
        quantity: Decimal,
    ) -> Result<CostPreview, InventoryError> {
        let product = Name::parse(product)?;
        let quantity = positive("quantity", quantity)?;

        let mut tx = self.pool.begin().await?;
        let requirements = run_requirements(&mut tx, product.as_str(), quantity).await?;
        let simulation = simulate(&mut tx, &requirements).await?;
        tx.commit().await?;

        let quote = self.pricing.quote(simulation.raw_total()?, quantity)?;
        if !simulation.shortages.is_empty() {
            warn!(
                product = %product,
                shortages = simulation.shortages.len(),
                "Preview covers available stock only"
            );
        }

        Ok(CostPreview {
            product: product.into_inner(),
            quantity,
            unit_cost: quote.unit_cost,
            total_cost: quote.total_cost,
            suggested_price: quote.suggested_price,
            ingredients: simulation.ingredients()?,
            shortages: simulation.shortages,
        })
    }

    /// Produce a batch: check stock, consume lots FIFO, record the batch.
    ///
    /// Everything happens in one transaction under the write lock. If any
    /// ingredient is short nothing is changed and the shortages are
    /// returned as [`ProductionOutcome::Short`].
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::InvalidQuantity` for a non-positive quantity,
    /// a negative sale price or a cost figure that overflows (nothing is
    /// changed), `InventoryError::InvalidName` for a blank
    /// product, and `InventoryError::Persistence` if any write fails (the
    /// whole run is rolled back).
    #[instrument(skip(self, request), fields(product = %request.product, quantity = %request.quantity))]
    pub async fn produce(
        &self,
        request: ProductionRequest,
    ) -> Result<ProductionOutcome, InventoryError> {
        let product = Name::parse(&request.product)?;
        let quantity = positive("quantity", request.quantity)?;
        let sale_price = request
            .sale_price
            .map(|price| non_negative("sale price", price))
            .transpose()?
            .unwrap_or(Decimal::ZERO);
        let produced_on = request
            .produced_on
            .unwrap_or_else(|| Utc::now().date_naive());

        let _guard = self.write_lock.lock().await;
        let mut tx = self.begin_write().await?;

        let requirements = run_requirements(&mut tx, product.as_str(), quantity).await?;
        let simulation = simulate(&mut tx, &requirements).await?;
        if !simulation.shortages.is_empty() {
            warn!(
                product = %product,
                %quantity,
                shortages = simulation.shortages.len(),
                "Insufficient stock, nothing produced"
            );
            return Ok(ProductionOutcome::Short(simulation.shortages));
        }

        let quote = self.pricing.quote(simulation.raw_total()?, quantity)?;

        let mut lots = LotRepository::new(&mut tx);
        for plan in &simulation.plans {
            lots.apply_plan(plan).await?;
        }

        let mut batches = BatchRepository::new(&mut tx);
        let batch = batches
            .insert(&CreateBatchInput {
                product: product.into_inner(),
                quantity_produced: quantity,
                unit_cost: quote.unit_cost,
                total_cost: quote.total_cost,
                suggested_price: quote.suggested_price,
                sale_price,
                produced_on,
            })
            .await?;

        let mut consumption_rows = 0;
        for plan in &simulation.plans {
            consumption_rows += batches.record_consumption(batch.id, plan).await?;
        }

        tx.commit().await?;

        info!(
            batch_id = %batch.id,
            product = %batch.product,
            quantity = %batch.quantity_produced,
            total_cost = %batch.total_cost,
            unit_cost = %batch.unit_cost,
            suggested_price = %batch.suggested_price,
            consumption_rows,
            "Produced batch"
        );

        Ok(ProductionOutcome::Produced(batch))
    }
}

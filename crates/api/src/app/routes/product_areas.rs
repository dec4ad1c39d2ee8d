use featreq_auth::User;
use featreq_core::{Registration, Registry};

use super::rows;
use crate::app::SharedDatabase;

const ALL_PRODUCT_AREAS: &str = "
    SELECT _id, name
    FROM feature_request.product_areas
    ORDER BY _id
";

pub fn register(registry: &mut Registry<User>, db: SharedDatabase) {
    registry.register(Registration::retrieve("product_areas", move |_| {
        rows(&*db, ALL_PRODUCT_AREAS, &[])
    }));
}

use async_graphql::{EmptySubscription, Schema};

use super::mutations::MutationRoot;
use super::queries::QueryRoot;

/// GraphQL Schema type
pub type RoastrSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Build the GraphQL schema
pub fn build_schema() -> RoastrSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription).finish()
}

use crate::exceptions::ExceptionSet;
use crate::model::PolicySetModel;
use crate::policy::EffectiveConfig;
use scpguard_types::Finding;
use time::Date;

mod document_valid;
mod expired_exceptions;
mod protected_actions;
mod region_restriction;
mod size_limit;
mod utils;


pub fn run_all(
    model: &PolicySetModel,
    cfg: &EffectiveConfig,
    exceptions: &ExceptionSet,
    today: Date,
    out: &mut Vec<Finding>,
) {
    document_valid::run(model, cfg, out);
    size_limit::run(model, cfg, out);
    protected_actions::run(model, cfg, out);
    region_restriction::run(model, cfg, out);
    expired_exceptions::run(exceptions, cfg, today, out);
}

use crate::generator::state::{RunState, StateUpdate};

/// 流水线中的一个阶段
///
/// 阶段只读取上一阶段的状态并返回增量；可预期的失败（无结果、服务错误）
/// 以错误信息的形式写入增量，不向外传播。
#[allow(async_fn_in_trait)]
pub trait Stage {
    fn name(&self) -> &'static str;

    async fn execute(&self, state: &RunState) -> StateUpdate;
}

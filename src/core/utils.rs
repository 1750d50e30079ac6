/// 生成下一个请求 ID（跳过 0）
pub fn next_id(id: &mut u64) -> u64 {
    let out = (*id).max(1);
    *id = out.wrapping_add(1).max(1);
    out
}

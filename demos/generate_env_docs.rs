//! 环境变量文档生成工具
//!
//! 输出所有 GEASY_* 环境变量的 Markdown 文档

use geasy_translate::env;

fn main() {
    println!("{}", env::generate_env_docs());
}

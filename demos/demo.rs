//! 用于演示 `drama_catalog_rs` 库的核心功能。
//!
//! ## 如何运行
//!
//! ```bash
//! cargo run --package drama_catalog_rs --example demo -- "cinta"
//! ```

use std::io::{self, Write};

use drama_catalog_rs::{
    CatalogClient, CatalogItem, ViewState,
    config::load_config,
    error::Result,
    player::source::PlayerCaps,
};

use tracing::{Level, error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    info!("正在初始化...");
    let client = CatalogClient::new(load_config()?)?;

    let home = client.home().await;
    for (name, section) in [
        ("推荐", &home.for_you),
        ("最新", &home.new_releases),
        ("排行", &home.rank),
    ] {
        match section {
            ViewState::Ready(items) => info!("{}: {} 部", name, items.len()),
            ViewState::Empty => warn!("{}: 没有内容", name),
            ViewState::Failed { message, .. } => error!("{}: {}", name, message),
        }
    }

    let query = std::env::args().nth(1).unwrap_or_else(|| "cinta".to_string());
    info!("准备搜索: '{}'", query);

    let suggestions = client.suggestions(&query).await;
    if !suggestions.is_empty() {
        info!("搜索建议: {}", suggestions.join(" / "));
    }

    let results = match client.search(&query).await {
        ViewState::Ready(items) => items,
        ViewState::Empty => {
            error!("没有找到与 '{}' 相关的剧集，程序退出。", query);
            return Ok(());
        }
        ViewState::Failed { message, .. } => {
            error!("搜索失败: {}", message);
            return Ok(());
        }
    };

    let chosen = prompt_user_for_selection(&results)?;
    let selected = &results[chosen];
    client.select(selected);

    let Some(link) = selected.detail_link() else {
        error!("'{}' 没有有效的 ID，无法打开详情。", selected.title);
        return Ok(());
    };
    info!("正在打开 {}", link.href());

    let detail = match client.detail(&link.href()).await {
        ViewState::Ready(detail) => detail,
        other => {
            error!("详情加载失败: {:?}", other);
            return Ok(());
        }
    };
    info!("标题: {}", detail.item.title);
    info!("类型: {}", detail.item.genre);
    for paragraph in detail.item.synopsis_paragraphs() {
        info!("  {}", paragraph);
    }

    let episodes = client.episodes(&detail).await;
    let Some(episodes) = episodes.ready() else {
        warn!("没有可播放的集数。");
        return Ok(());
    };
    info!("共 {} 集，第一集: {}", episodes.len(), episodes[0].label());

    let series_id = detail.item.id.as_deref().unwrap_or(&detail.requested_id);
    let mut player = client
        .player()
        .with_notice_sink(|notice| info!("[提示] {}", notice.message()));
    player.load(series_id, 1).await;

    let caps = PlayerCaps {
        hls_library: true,
        native_hls: false,
    };
    match player.prepare_playback(caps).await {
        ViewState::Ready(prepared) => info!(
            "播放地址: {} ({:?})",
            prepared.source.url, prepared.setup
        ),
        other => warn!("无法播放第一集: {:?}", other),
    }

    if let Some(next) = player.next() {
        info!("下一集链接: {}", next.href());
    }
    player.dispose();

    Ok(())
}

/// 将搜索结果打印到控制台，并提示用户进行选择。
fn prompt_user_for_selection(results: &[CatalogItem]) -> Result<usize> {
    println!("找到了 {} 部剧集，请选择一个：\n", results.len());

    for (index, item) in results.iter().enumerate() {
        println!("  [{:2}] 标题: {} | 类型: {}", index + 1, item.title, item.genre);
        let episode_display = item
            .episode_number
            .map(|n| n.to_string())
            .unwrap_or_else(|| "N/A".to_string());
        println!(
            "       ID: {} | 集数: {}",
            item.id.as_deref().unwrap_or("N/A"),
            episode_display
        );
        println!("       封面: {}", item.cover);
    }

    loop {
        print!("\n请输入编号 (1-{}): ", results.len());
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        match input.trim().parse::<usize>() {
            Ok(num) if num > 0 && num <= results.len() => {
                break Ok(num - 1);
            }
            _ => {
                eprintln!("\n输入无效，请输入一个列表中的有效编号。\n");
            }
        }
    }
}

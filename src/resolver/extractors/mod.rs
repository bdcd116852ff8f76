// Extraction strategies - one per upstream response schema
//
// The upstream has changed its API shape several times:
// - item-info: `item_list[].video.{download_addr|play_addr}.url_list`
// - aweme-detail: `aweme_detail.video.{download_addr|play_addr}.url_list`
// - mirror: third-party service answering `{cover, video|audio}`
//
// ExtractionChain tries them in that order until one succeeds.

mod traits;
mod item_info;
mod aweme_detail;
mod mirror;
mod orchestrator;

pub use traits::ExtractionStrategy;
pub use item_info::ItemInfoExtractor;
pub use aweme_detail::AwemeDetailExtractor;
pub use mirror::MirrorExtractor;
pub use orchestrator::ExtractionChain;
